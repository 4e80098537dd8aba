//! Service startup logging for the agency gateway

use std::env;
use tracing::{info, warn};

use gateway_types::PartnerConfig;

/// Logs service information at startup
pub fn log_service_info() {
	// Root package identity, not this crate's
	let service_name = "agency-gateway";
	let service_version = env!("CARGO_PKG_VERSION");

	info!("=== Agency Gateway Starting ===");
	info!("🚀 Service: {} v{}", service_name, service_version);
	info!("💻 Platform: {} ({})", env::consts::OS, env::consts::ARCH);

	if let Ok(cwd) = env::current_dir() {
		info!("📁 Working Directory: {}", cwd.display());
	}

	if let Ok(rust_log) = env::var("RUST_LOG") {
		info!("🔧 Log Level: {}", rust_log);
	}

	if let Ok(config_path) = env::var("CONFIG_PATH") {
		info!("📋 Config Path: {}", config_path);
	}

	info!(
		"🕒 Started at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs which partners will be called live and which stay offline
pub fn log_partner_summary(partners: &[PartnerConfig], federation_configured: bool) {
	if partners.is_empty() {
		warn!("⚠️ No partners configured; quote aggregation will return no quotes");
	}

	for config in partners {
		info!(
			"🔌 Partner {}: {:?} ({})",
			config.partner_id,
			config.mode(),
			config.base_url
		);
	}

	if !federation_configured {
		info!("🔐 SSO federation signing not configured");
	}
}

/// Logs service shutdown information
pub fn log_service_shutdown() {
	info!("🛑 Agency Gateway Shutting Down");
	info!(
		"🕒 Shutdown at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}
