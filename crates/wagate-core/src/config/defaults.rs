//! Default value functions used by serde for config deserialization.

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    8000
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_country_code() -> String {
    "55".to_string()
}

pub fn default_bridge_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

pub fn default_db_host() -> String {
    "localhost".to_string()
}

pub fn default_db_port() -> u16 {
    3306
}

pub fn default_db_user() -> String {
    "root".to_string()
}

pub fn default_db_name() -> String {
    "wagate".to_string()
}

pub fn default_max_connections() -> u32 {
    5
}

pub fn default_max_lifetime_secs() -> u64 {
    1800
}
