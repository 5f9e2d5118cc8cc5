use std::str::FromStr;
use std::sync::Arc;

use clap::{ArgAction, Subcommand};
use serde_json::json;

use crate::auth::CallerIdentity;
use crate::cli::utils::{output_user, output_user_page};
use crate::cli::OutputFormat;
use crate::config;
use crate::database::models::{SubscriptionStatus, UserRole};
use crate::database::{DatabaseManager, PgUserRepository};
use crate::users::{UserService, UserStore};

/// `--status` value; `none` selects users without a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusArg(pub Option<SubscriptionStatus>);

impl FromStr for StatusArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("none") {
            return Ok(StatusArg(None));
        }
        s.parse().map(|status| StatusArg(Some(status)))
    }
}

#[derive(Subcommand)]
pub enum UsersCommands {
    #[command(about = "List users, ten per page, ordered by username")]
    List {
        #[arg(long = "as", help = "Id of the admin running the command")]
        caller: String,
        #[arg(long, default_value_t = 0, help = "Number of pages to skip")]
        page: i64,
        #[arg(long, help = "Case-insensitive email substring")]
        email: Option<String>,
        #[arg(long = "role", help = "Only these roles (repeatable)")]
        roles: Vec<UserRole>,
        #[arg(long = "status", help = "Only these subscription statuses, or 'none' (repeatable)")]
        statuses: Vec<StatusArg>,
        #[arg(long, help = "Only users with this admin flag")]
        admin: Option<bool>,
    },

    #[command(about = "Change a user's role")]
    SetRole {
        #[arg(help = "Target user id")]
        id: String,
        #[arg(help = "OWNER, ADMIN, EDITOR or VIEWER")]
        role: UserRole,
        #[arg(long = "as", help = "Id of the admin running the command")]
        caller: String,
    },

    #[command(about = "Set the legacy admin flag (writes ADMIN or VIEWER)")]
    SetAdmin {
        #[arg(help = "Target user id")]
        id: String,
        #[arg(action = ArgAction::Set, help = "true or false")]
        is_admin: bool,
        #[arg(long = "as", help = "Id of the admin running the command")]
        caller: String,
    },
}

pub async fn handle(cmd: UsersCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    let pool = DatabaseManager::connect_lazy(&config.database)?;
    let store: Arc<dyn UserStore> = Arc::new(PgUserRepository::new(pool));
    let service = UserService::new(store.clone(), config.security.enable_audit_logging);

    match cmd {
        UsersCommands::List { caller, page, email, roles, statuses, admin } => {
            let caller = load_caller(store.as_ref(), &caller).await?;
            let mut filter = json!({});
            if let Some(email) = email {
                filter["emailContains"] = json!(email);
            }
            if !roles.is_empty() {
                filter["roleIn"] = json!(roles);
            }
            if !statuses.is_empty() {
                let statuses: Vec<Option<SubscriptionStatus>> = statuses.into_iter().map(|s| s.0).collect();
                filter["subscriptionStatusIn"] = json!(statuses);
            }
            if let Some(admin) = admin {
                filter["isAdmin"] = json!(admin);
            }

            let args = json!({ "skipPages": page, "filter": filter });
            let result = service.get_paginated_users(args, caller.as_ref()).await?;
            output_user_page(&output_format, page, &result)
        }
        UsersCommands::SetRole { id, role, caller } => {
            let caller = load_caller(store.as_ref(), &caller).await?;
            let user = service
                .update_user_role_by_id(json!({ "id": id, "role": role }), caller.as_ref())
                .await?;
            output_user(&output_format, "Role updated", &user)
        }
        UsersCommands::SetAdmin { id, is_admin, caller } => {
            let caller = load_caller(store.as_ref(), &caller).await?;
            let user = service
                .update_is_user_admin_by_id(json!({ "id": id, "isAdmin": is_admin }), caller.as_ref())
                .await?;
            output_user(&output_format, "Admin flag updated", &user)
        }
    }
}

/// Resolve `--as` the same way the HTTP middleware resolves a token subject.
async fn load_caller(store: &dyn UserStore, id: &str) -> anyhow::Result<Option<CallerIdentity>> {
    let user = store.find_by_id(id).await?;
    if user.is_none() {
        tracing::warn!("Caller '{}' does not exist; running unauthenticated", id);
    }
    Ok(user.as_ref().map(CallerIdentity::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_arg_accepts_none() {
        assert_eq!("none".parse::<StatusArg>().unwrap(), StatusArg(None));
        assert_eq!(
            "past_due".parse::<StatusArg>().unwrap(),
            StatusArg(Some(SubscriptionStatus::PastDue))
        );
        assert!("trial".parse::<StatusArg>().is_err());
    }
}
