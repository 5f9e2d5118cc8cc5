use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::database::models::User;
use crate::users::PaginatedUsers;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data) = data {
                response["data"] = data;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

pub fn output_user(output_format: &OutputFormat, message: &str, user: &User) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => output_success(output_format, message, Some(serde_json::to_value(user)?)),
        OutputFormat::Text => {
            output_success(output_format, message, None)?;
            println!("{}", user_line(user));
            Ok(())
        }
    }
}

pub fn output_user_page(output_format: &OutputFormat, page: i64, result: &PaginatedUsers) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Text => {
            if result.users.is_empty() {
                println!("No users found");
            }
            for user in &result.users {
                println!("{}", user_line(user));
            }
            println!("Page {} of {}", page + 1, result.total_pages);
        }
    }
    Ok(())
}

fn user_line(user: &User) -> String {
    let status = user
        .subscription_status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<24} {:<32} {:<7} admin={:<5} {:<20} {}",
        user.username, user.email, user.role, user.is_admin, status, user.id
    )
}
