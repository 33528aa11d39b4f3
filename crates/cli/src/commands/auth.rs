//! Auth Commands

use anyhow::Result;
use apiprobe_common::{Identity, SessionProvider, SessionState, Snapshot};
use clap::Subcommand;
use serde::Serialize;

use crate::context::Context;
use crate::output::{cell, print_info, print_item, print_success, print_warning, with_spinner, TableDisplay};

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with email and password
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "APIPROBE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in
    Signup {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "APIPROBE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the current session
    Status,

    /// Print a fresh bearer token for the signed-in user
    Token,
}

/// Session display wrapper for serialization
#[derive(Serialize)]
pub struct SessionDisplay {
    pub state: String,
    pub uid: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&Snapshot> for SessionDisplay {
    fn from(snapshot: &Snapshot) -> Self {
        let (state, reason) = match snapshot.state() {
            SessionState::SignedOut => ("signed out", None),
            SessionState::PendingCredential { .. } => ("pending", None),
            SessionState::Ready { .. } => ("ready", None),
            SessionState::CredentialFailed { reason, .. } => ("credential failed", Some(reason.clone())),
        };
        let identity = snapshot.identity();
        Self {
            state: state.to_string(),
            uid: identity.map(|i| i.uid.clone()),
            email: identity.and_then(|i| i.email.clone()),
            display_name: identity.and_then(|i| i.display_name.clone()),
            reason,
        }
    }
}

impl TableDisplay for SessionDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["State", "UID", "Email", "Name"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.state.clone(),
            cell(self.uid.as_deref()),
            cell(self.email.as_deref()),
            cell(self.display_name.as_deref()),
        ]
    }
}

/// Execute auth command
pub async fn execute(cmd: AuthCommands, ctx: &Context) -> Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let identity = with_spinner("Signing in...", ctx.identity.sign_in(&email, &password)).await?;
            finish_sign_in(ctx, &identity).await
        }

        AuthCommands::Signup { email, password } => {
            let identity = with_spinner("Creating account...", ctx.identity.sign_up(&email, &password)).await?;
            finish_sign_in(ctx, &identity).await
        }

        AuthCommands::Logout => {
            ctx.identity.sign_out()?;
            print_success("Signed out.");
            Ok(())
        }

        AuthCommands::Status => {
            let snapshot = ctx.session.snapshot();
            if !snapshot.is_signed_in() {
                print_info("Not signed in.");
            }
            print_item(&SessionDisplay::from(&snapshot), ctx.format);
            Ok(())
        }

        AuthCommands::Token => {
            let snapshot = ctx.signed_in()?;
            let credential = snapshot.require_credential()?;
            println!("{}", credential.as_str());
            Ok(())
        }
    }
}

async fn finish_sign_in(ctx: &Context, identity: &Identity) -> Result<()> {
    let snapshot = settled(&ctx.session, &identity.uid).await?;
    if let SessionState::CredentialFailed { reason, .. } = snapshot.state() {
        print_warning(&format!("Signed in, but no credential is available: {}", reason));
    } else {
        print_success(&format!("Signed in as {}", identity.label()));
    }
    print_item(&SessionDisplay::from(&snapshot), ctx.format);
    Ok(())
}

/// Wait until credential retrieval for `uid` has finished either way
async fn settled(session: &SessionProvider, uid: &str) -> Result<Snapshot> {
    let mut rx = session.watch();
    let snapshot = rx
        .wait_for(|s| match s.state() {
            SessionState::Ready { identity, .. } | SessionState::CredentialFailed { identity, .. } => {
                identity.uid == uid
            }
            _ => false,
        })
        .await?
        .clone();
    Ok(snapshot)
}
