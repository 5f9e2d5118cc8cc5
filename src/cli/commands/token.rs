use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::OutputFormat;
use crate::config;

pub fn handle(user_id: String, hours: Option<u64>, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;
    let claims = Claims::new(user_id, hours.unwrap_or(security.jwt_expiry_hours))?;
    let token = generate_jwt(&claims, &security.jwt_secret)?;

    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "token": token,
                    "sub": claims.sub,
                    "exp": claims.exp,
                }))?
            );
        }
        OutputFormat::Text => println!("{}", token),
    }
    Ok(())
}
