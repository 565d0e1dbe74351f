use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 11] = [
        "RUST_LOG",
        "BLT_HOST",
        "BLT_PORT",
        "BLT_DATABASE_URL",
        "BLT_PUBLIC_BASE_URL",
        "BLT_NOTIFICATION_URL",
        "BLT_EVENT_TITLE",
        "BLT_PRICE_GENERAL",
        "BLT_CURRENCY",
        "BLT_VERIFY_TIMEOUT_SECS",
        "BLT_SMTP_HOST",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(v) => v,
            Err(VarError::NotPresent) => "Not set".to_string(),
            Err(VarError::NotUnicode(_)) => "Invalid unicode".to_string(),
        };
        println!("{name}: {val}");
    });
}
