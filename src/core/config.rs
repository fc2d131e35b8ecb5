use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub storage_path: String,
    pub db_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api_base_url =
            env::var("RECALL_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
        let storage_path = env::var("RECALL_STORAGE_PATH").unwrap_or("./".to_string());
        let db_path = format!("{}/db", storage_path);

        Self {
            api_base_url,
            storage_path,
            db_path,
        }
    }
}
