use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Runtime configuration for the depot services.
///
/// `unit_price` is the flat per-cylinder rate used when an order is placed
/// without a caller-supplied total. `gateway_server_key` is the shared secret
/// the payment gateway signs webhook notifications with.
#[derive(Debug, Clone)]
pub struct DepotConfig {
    pub unit_price: Decimal,
    pub gateway_server_key: String,
}

impl Default for DepotConfig {
    fn default() -> Self {
        Self {
            unit_price: dec!(20000),
            gateway_server_key: "dev-server-key".to_string(),
        }
    }
}

impl DepotConfig {
    /// Builds a config from the environment, falling back to defaults.
    ///
    /// Recognized variables: `GASDEPOT_UNIT_PRICE`,
    /// `GASDEPOT_GATEWAY_SERVER_KEY`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("GASDEPOT_UNIT_PRICE")
            && let Ok(price) = raw.parse::<Decimal>()
        {
            config.unit_price = price;
        }
        if let Ok(key) = std::env::var("GASDEPOT_GATEWAY_SERVER_KEY") {
            config.gateway_server_key = key;
        }
        config
    }
}
