//! SAML 2.0 response and assertion trees

use chrono::{DateTime, Duration, Utc};
use gateway_types::ProfileFields;

use super::xml::XmlElement;
use super::FederationError;

pub const VALIDITY_SKEW_MINUTES: i64 = 5;

pub const NAMEID_UNSPECIFIED: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified";
pub const BEARER_METHOD: &str = "urn:oasis:names:tc:SAML:2.0:cm:bearer";
pub const PASSWORD_PROTECTED: &str =
	"urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport";
pub const ATTRNAME_BASIC: &str = "urn:oasis:names:tc:SAML:2.0:attrname-format:basic";
pub const STATUS_SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";

pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
pub const ENVELOPED_SIGNATURE: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
pub const SHA256_DIGEST: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

/// SAML timestamps are UTC with second precision
pub fn saml_instant(at: DateTime<Utc>) -> String {
	at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Everything that varies between assertions
#[derive(Debug, Clone)]
pub struct AssertionParams<'a> {
	pub assertion_id: &'a str,
	pub issuer: &'a str,
	pub audience: &'a str,
	pub recipient: &'a str,
	pub user_id: &'a str,
	pub now: DateTime<Utc>,
	pub attributes: &'a [(&'static str, String)],
}

/// Profile blob carried as the `ProfileData` attribute value
///
/// Fixed element order; absent fields become empty elements.
pub fn profile_blob(profile: &ProfileFields) -> Result<String, FederationError> {
	let fields = profile
		.ordered()
		.into_iter()
		.map(|(name, value)| XmlElement::new(name).text(value.unwrap_or_default()));
	XmlElement::new("ProfileData")
		.children(fields)
		.to_canonical_string()
}

fn attribute(name: &str, value: &str) -> XmlElement {
	XmlElement::new("saml:Attribute")
		.attr("Name", name)
		.attr("NameFormat", ATTRNAME_BASIC)
		.child(XmlElement::new("saml:AttributeValue").text(value))
}

/// Unsigned assertion; the signature is inserted after `saml:Issuer` later
pub fn build_assertion(params: &AssertionParams<'_>) -> XmlElement {
	let issue_instant = saml_instant(params.now);
	let not_before = saml_instant(params.now - Duration::minutes(VALIDITY_SKEW_MINUTES));
	let not_on_or_after = saml_instant(params.now + Duration::minutes(VALIDITY_SKEW_MINUTES));

	let subject = XmlElement::new("saml:Subject")
		.child(
			XmlElement::new("saml:NameID")
				.attr("Format", NAMEID_UNSPECIFIED)
				.text(params.user_id),
		)
		.child(
			XmlElement::new("saml:SubjectConfirmation")
				.attr("Method", BEARER_METHOD)
				.child(
					XmlElement::new("saml:SubjectConfirmationData")
						.attr("NotBefore", not_before.as_str())
						.attr("NotOnOrAfter", not_on_or_after.as_str())
						.attr("Recipient", params.recipient),
				),
		);

	let conditions = XmlElement::new("saml:Conditions")
		.attr("NotBefore", not_before.as_str())
		.attr("NotOnOrAfter", not_on_or_after.as_str())
		.child(
			XmlElement::new("saml:AudienceRestriction")
				.child(XmlElement::new("saml:Audience").text(params.audience)),
		);

	let authn = XmlElement::new("saml:AuthnStatement")
		.attr("AuthnInstant", issue_instant.as_str())
		.attr("SessionIndex", params.assertion_id)
		.child(
			XmlElement::new("saml:AuthnContext")
				.child(XmlElement::new("saml:AuthnContextClassRef").text(PASSWORD_PROTECTED)),
		);

	let attributes = XmlElement::new("saml:AttributeStatement").children(
		params
			.attributes
			.iter()
			.map(|(name, value)| attribute(name, value)),
	);

	XmlElement::new("saml:Assertion")
		.attr("ID", params.assertion_id)
		.attr("IssueInstant", issue_instant.as_str())
		.attr("Version", "2.0")
		.child(XmlElement::new("saml:Issuer").text(params.issuer))
		.child(subject)
		.child(conditions)
		.child(authn)
		.child(attributes)
}

pub fn build_signed_info(assertion_id: &str, digest_b64: &str) -> XmlElement {
	XmlElement::new("ds:SignedInfo")
		.child(XmlElement::new("ds:CanonicalizationMethod").attr("Algorithm", EXC_C14N))
		.child(XmlElement::new("ds:SignatureMethod").attr("Algorithm", RSA_SHA256))
		.child(
			XmlElement::new("ds:Reference")
				.attr("URI", format!("#{}", assertion_id))
				.child(
					XmlElement::new("ds:Transforms")
						.child(XmlElement::new("ds:Transform").attr("Algorithm", ENVELOPED_SIGNATURE))
						.child(XmlElement::new("ds:Transform").attr("Algorithm", EXC_C14N)),
				)
				.child(XmlElement::new("ds:DigestMethod").attr("Algorithm", SHA256_DIGEST))
				.child(XmlElement::new("ds:DigestValue").text(digest_b64)),
		)
}

pub fn build_signature(
	signed_info: XmlElement,
	signature_b64: &str,
	certificate_b64: &str,
) -> XmlElement {
	XmlElement::new("ds:Signature")
		.child(signed_info)
		.child(XmlElement::new("ds:SignatureValue").text(signature_b64))
		.child(
			XmlElement::new("ds:KeyInfo").child(
				XmlElement::new("ds:X509Data")
					.child(XmlElement::new("ds:X509Certificate").text(certificate_b64)),
			),
		)
}

pub fn build_response(
	response_id: &str,
	issuer: &str,
	destination: &str,
	now: DateTime<Utc>,
	assertion: XmlElement,
) -> XmlElement {
	XmlElement::new("samlp:Response")
		.attr("Destination", destination)
		.attr("ID", response_id)
		.attr("IssueInstant", saml_instant(now))
		.attr("Version", "2.0")
		.child(XmlElement::new("saml:Issuer").text(issuer))
		.child(
			XmlElement::new("samlp:Status")
				.child(XmlElement::new("samlp:StatusCode").attr("Value", STATUS_SUCCESS)),
		)
		.child(assertion)
}
