//! Agency Gateway
//!
//! Loads configuration, builds the gateway and prints a partner health report

use agency_gateway::{
	init_tracing_from_settings, load_config, log_partner_summary, log_service_info,
	log_service_shutdown, serde_json, GatewayBuilder,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	// Load .env file if it exists
	dotenvy::dotenv().ok();

	let settings = match load_config() {
		Ok(settings) => settings,
		Err(e) => {
			eprintln!("Failed to load configuration: {}", e);
			return Err(e.into());
		},
	};

	init_tracing_from_settings(&settings.logging);
	log_service_info();

	let gateway = GatewayBuilder::new().with_settings(settings).build().map_err(|e| {
		error!("Failed to build gateway: {}", e);
		e
	})?;
	log_partner_summary(gateway.partner_configs(), gateway.signer().is_configured());

	let health = gateway.aggregator().providers_health().await;
	let healthy = health.values().filter(|result| result.healthy).count();
	info!("{}/{} partner(s) healthy", healthy, health.len());

	let report = serde_json::json!({
		"service": env!("CARGO_PKG_NAME"),
		"version": env!("CARGO_PKG_VERSION"),
		"federation_configured": gateway.signer().is_configured(),
		"partners": health,
	});
	println!("{}", serde_json::to_string_pretty(&report)?);

	gateway.flush_audit().await;
	log_service_shutdown();
	Ok(())
}
