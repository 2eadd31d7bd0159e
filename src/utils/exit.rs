#[cfg(not(target_arch = "wasm32"))]
use colored::*;

use crate::utils::random::get_random_u128;

const MESSAGES: [(&str, &str); 6] = [
        ("The globe has stopped spinning.", "cyan"),
        ("Every marker has been taken down. Goodbye.", "yellow"),
        ("Null island is quiet again.", "green"),
        ("The sun has set on every time zone at once.", "magenta"),
        ("Orbis has left orbit.", "blue"),
        ("The last frame has been drawn.", "white"),
];

/// Picks the farewell line logged when the event loop exits.
///
/// Returns an empty string when disabled in the [`Config`](crate::config::Config).
pub fn get_exit_message(config: &crate::config::Config) -> String
{
        if !config.show_exit_message
        {
                return String::new();
        }

        let choice = get_random_u128(MESSAGES.len() as u128).unwrap_or(0) as usize;

        let (message, color) = MESSAGES[choice.min(MESSAGES.len() - 1)];

        paint(message, color)
}

#[cfg(not(target_arch = "wasm32"))]
fn paint(
        message: &str,
        color: &str,
) -> String
{
        match color
        {
                "cyan" => message.cyan().to_string(),
                "yellow" => message.yellow().to_string(),
                "green" => message.green().to_string(),
                "magenta" => message.magenta().to_string(),
                "blue" => message.blue().to_string(),
                "white" => message.white().to_string(),
                _ => message.to_string(),
        }
}

// The browser console does not understand ANSI escapes.
#[cfg(target_arch = "wasm32")]
fn paint(
        message: &str,
        _color: &str,
) -> String
{
        message.to_string()
}

pub fn show_exit_message(config: &crate::config::Config)
{
        let message = get_exit_message(config);

        if !message.is_empty()
        {
                log::info!("{message}");
        }
}
