//! Terminal output utilities

use anyhow::Result;
use console::style;
use keyward_lifecycle::ops::{ConfigView, Credentials, RoleView};
use keyward_lifecycle::Response;
use owo_colors::OwoColorize;
use tabled::{settings::Style, Table, Tabled};

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Print any response as pretty JSON
pub fn json(response: &Response) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

fn lease(seconds: u64) -> String {
    if seconds == 0 {
        "default".to_string()
    } else {
        format!("{}s", seconds)
    }
}

pub fn config(view: &ConfigView) {
    header("Control plane");
    kv("url", &view.url);
    kv("username", &view.username);
    kv("password", view.password);
    if view.skip_ssl {
        kv("skip_ssl", &"true".yellow().to_string());
    } else {
        kv("skip_ssl", "false");
    }
}

#[derive(Tabled)]
struct KeyRow {
    #[tabled(rename = "ACCESS KEY ID")]
    access_key_id: String,
    #[tabled(rename = "CREATED")]
    create_date: String,
    #[tabled(rename = "SECRET")]
    secret: String,
}

pub fn role(view: &RoleView) {
    header(&format!("Role {}", view.name));
    kv("namespace", &view.namespace);
    kv("username", &view.username);
    let state = if view.state == "invalid" {
        view.state.red().to_string()
    } else {
        view.state.clone()
    };
    kv("state", &state);
    kv("ttl", &lease(view.ttl));
    kv("max_ttl", &lease(view.max_ttl));

    let rows: Vec<KeyRow> = view
        .access_keys
        .iter()
        .map(|k| KeyRow {
            access_key_id: k.access_key_id.clone(),
            create_date: k.create_date.clone(),
            secret: if k.has_secret {
                "stored".green().to_string()
            } else {
                "unknown".dimmed().to_string()
            },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);
}

pub fn credentials(creds: &Credentials) {
    kv("access_key_id", &creds.access_key_id);
    kv("secret_access_key", creds.secret_access_key.expose());
    kv("namespace", &creds.namespace);
    kv("username", &creds.username);
    kv("ttl", &lease(creds.ttl));
    kv("max_ttl", &lease(creds.max_ttl));
}

pub fn names(names: &[String], empty: &str) {
    if names.is_empty() {
        info(empty);
        return;
    }
    for name in names {
        println!("{}", name);
    }
}

/// Human-readable rendering for responses of any operation
pub fn response(response: &Response) {
    match response {
        Response::Config(view) => config(view),
        Response::Role(view) => role(view),
        Response::Credentials(creds) => credentials(creds),
        Response::Names(list) => names(list, "Nothing to show"),
        Response::Migrated { namespace, roles } => {
            success(&format!(
                "Migrated namespace {} ({} roles)",
                namespace,
                roles.len()
            ));
            names(roles, "No roles created");
        }
        Response::PasswordRotated { username } => {
            success(&format!("Rotated password of {}", username))
        }
        Response::Deleted { name } => success(&format!("Deleted {}", name)),
        Response::Empty => success("Done"),
    }
}
