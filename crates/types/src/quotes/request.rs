//! Unified quote request submitted by the presentation layer

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{errors::QuoteValidationError, ProductFamily, ProductType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
	Male,
	Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthClass {
	PreferredPlus,
	Preferred,
	StandardPlus,
	Standard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
	pub date_of_birth: NaiveDate,
	pub gender: Gender,
	/// Two-letter state of residence
	pub state: String,
	pub tobacco_use: bool,
	pub health_class: Option<HealthClass>,
}

impl Applicant {
	/// Age in whole years on `today`
	///
	/// One year is subtracted when `today` falls before the birthday in the
	/// current year. `None` for a birth date in the future.
	pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
		let dob = self.date_of_birth;
		if dob > today {
			return None;
		}

		let mut age = today.year() - dob.year();
		if (today.month(), today.day()) < (dob.month(), dob.day()) {
			age -= 1;
		}
		u32::try_from(age).ok()
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedQuoteRequest {
	/// Generated when absent
	pub request_id: Option<String>,
	pub product_type: ProductType,
	pub applicant: Applicant,
	/// Death benefit for life products
	pub face_amount: Option<f64>,
	pub term_years: Option<u32>,
	/// Single premium for annuity products
	pub premium_amount: Option<f64>,
	/// Only keep quotes from these carriers
	pub carrier_ids: Option<Vec<String>>,
	/// Drop quotes whose monthly premium exceeds this ceiling
	pub max_premium: Option<f64>,
	/// Agent on whose behalf the quotes are requested; copied into audit records
	pub user_id: Option<String>,
}

impl UnifiedQuoteRequest {
	pub fn family(&self) -> ProductFamily {
		self.product_type.family()
	}

	/// Reject requests no partner could price
	pub fn validate_on(&self, today: NaiveDate) -> Result<(), QuoteValidationError> {
		if self.applicant.date_of_birth > today {
			return Err(QuoteValidationError::InvalidDateOfBirth {
				reason: format!("{} is in the future", self.applicant.date_of_birth),
			});
		}

		let state = self.applicant.state.trim();
		if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
			return Err(QuoteValidationError::InvalidState {
				state: self.applicant.state.clone(),
			});
		}

		match self.family() {
			ProductFamily::Life => {
				let face_amount =
					self.face_amount
						.ok_or_else(|| QuoteValidationError::MissingRequiredField {
							field: "face_amount".to_string(),
						})?;
				check_positive("face_amount", face_amount)?;

				if self.product_type == ProductType::Term {
					match self.term_years {
						None => {
							return Err(QuoteValidationError::MissingRequiredField {
								field: "term_years".to_string(),
							})
						},
						Some(term) if term == 0 || term > 40 => {
							return Err(QuoteValidationError::InvalidTerm { term })
						},
						Some(_) => {},
					}
				}
			},
			ProductFamily::Annuity => {
				let premium =
					self.premium_amount
						.ok_or_else(|| QuoteValidationError::MissingRequiredField {
							field: "premium_amount".to_string(),
						})?;
				check_positive("premium_amount", premium)?;
			},
		}

		if let Some(max_premium) = self.max_premium {
			check_positive("max_premium", max_premium)?;
		}

		Ok(())
	}
}

fn check_positive(field: &str, value: f64) -> Result<(), QuoteValidationError> {
	if value.is_finite() && value > 0.0 {
		Ok(())
	} else {
		Err(QuoteValidationError::InvalidAmount {
			field: field.to_string(),
			reason: format!("{} must be a positive number", value),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn date(y: i32, m: u32, d: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, d).unwrap()
	}

	fn applicant(dob: NaiveDate) -> Applicant {
		Applicant {
			date_of_birth: dob,
			gender: Gender::Female,
			state: "TX".to_string(),
			tobacco_use: false,
			health_class: Some(HealthClass::Preferred),
		}
	}

	fn term_request() -> UnifiedQuoteRequest {
		UnifiedQuoteRequest {
			request_id: None,
			product_type: ProductType::Term,
			applicant: applicant(date(1985, 6, 15)),
			face_amount: Some(500_000.0),
			term_years: Some(20),
			premium_amount: None,
			carrier_ids: None,
			max_premium: None,
			user_id: None,
		}
	}

	#[test]
	fn test_age_before_and_after_birthday() {
		let a = applicant(date(1985, 6, 15));
		assert_eq!(a.age_on(date(2026, 6, 14)), Some(40));
		assert_eq!(a.age_on(date(2026, 6, 15)), Some(41));
		assert_eq!(a.age_on(date(2026, 12, 1)), Some(41));
		assert_eq!(a.age_on(date(2026, 1, 1)), Some(40));
	}

	#[test]
	fn test_age_leap_day_birth() {
		let a = applicant(date(2000, 2, 29));
		assert_eq!(a.age_on(date(2025, 2, 28)), Some(24));
		assert_eq!(a.age_on(date(2025, 3, 1)), Some(25));
	}

	#[test]
	fn test_age_future_birth_date() {
		let a = applicant(date(2030, 1, 1));
		assert_eq!(a.age_on(date(2026, 1, 1)), None);
	}

	#[test]
	fn test_valid_term_request() {
		assert!(term_request().validate_on(date(2026, 10, 19)).is_ok());
	}

	#[test]
	fn test_life_request_requires_face_amount() {
		let mut request = term_request();
		request.face_amount = None;
		assert_eq!(
			request.validate_on(date(2026, 10, 19)),
			Err(QuoteValidationError::MissingRequiredField {
				field: "face_amount".to_string()
			})
		);
	}

	#[test]
	fn test_term_request_rejects_bad_term() {
		let mut request = term_request();
		request.term_years = Some(0);
		assert!(matches!(
			request.validate_on(date(2026, 10, 19)),
			Err(QuoteValidationError::InvalidTerm { term: 0 })
		));
	}

	#[test]
	fn test_annuity_request_requires_premium() {
		let mut request = term_request();
		request.product_type = ProductType::Myga;
		request.face_amount = None;
		assert!(matches!(
			request.validate_on(date(2026, 10, 19)),
			Err(QuoteValidationError::MissingRequiredField { .. })
		));

		request.premium_amount = Some(-5.0);
		assert!(matches!(
			request.validate_on(date(2026, 10, 19)),
			Err(QuoteValidationError::InvalidAmount { .. })
		));

		request.premium_amount = Some(100_000.0);
		assert!(request.validate_on(date(2026, 10, 19)).is_ok());
	}

	#[test]
	fn test_rejects_bad_state() {
		let mut request = term_request();
		request.applicant.state = "Texas".to_string();
		assert!(matches!(
			request.validate_on(date(2026, 10, 19)),
			Err(QuoteValidationError::InvalidState { .. })
		));
	}
}
