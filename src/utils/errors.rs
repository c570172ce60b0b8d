//! User-Friendly Error Formatting
//!
//! Turns fatal errors from the binaries into messages with troubleshooting
//! hints for the common failure scenarios.

use std::fmt::Write;

/// Format error for user consumption
///
/// The whole context chain is inspected to pick a category, and printed in
/// full under "Technical Details".
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    let chain = format!("{:#}", error);
    let lower = chain.to_lowercase();

    if lower.contains("bind") || lower.contains("address") {
        format_network_error(&mut output);
    } else if lower.contains("config") {
        format_config_error(&mut output);
    } else if lower.contains("websocket") || lower.contains("connect") {
        format_connection_error(&mut output);
    } else {
        format_generic_error(&mut output, &error.to_string());
    }

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{}", chain).ok();
    writeln!(&mut output).ok();

    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: cursor-tether-relay -vvv"
    )
    .ok();
    writeln!(
        &mut output,
        "  - Write logs to a file with --log-file <path>"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();

    output
}

fn format_network_error(output: &mut String) {
    writeln!(output, "Network Binding Error").ok();
    writeln!(output).ok();
    writeln!(
        output,
        "Could not bind to the network address for WebSocket connections."
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Port already in use").ok();
    writeln!(output, "     → Check: ss -tlnp | grep 3000").ok();
    writeln!(output, "     → Stop the other process or use --port <port>").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Permission denied (port < 1024)").ok();
    writeln!(output, "     → Use port >= 1024").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Invalid listen address").ok();
    writeln!(output, "     → Should be 'IP:PORT' like '0.0.0.0:3000'").ok();
    writeln!(output, "     → Check CURSOR_TETHER_LISTEN / CURSOR_TETHER_PORT").ok();
}

fn format_config_error(output: &mut String) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "Problem with the configuration file.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Configuration file not found").ok();
    writeln!(
        output,
        "     → Specify one with: cursor-tether-relay -c /path/to/config.toml"
    )
    .ok();
    writeln!(output, "     → Without -c, built-in defaults are used").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Value out of range").ok();
    writeln!(
        output,
        "     → Rope resolution and intervals must be positive"
    )
    .ok();
    writeln!(output, "     → Damping factors must lie in 0.0-1.0").ok();
}

fn format_connection_error(output: &mut String) {
    writeln!(output, "Connection Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not reach the cursor relay.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Relay is not running").ok();
    writeln!(output, "     → Start it: cursor-tether-relay --port 3000").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Wrong URL").ok();
    writeln!(output, "     → Must start with ws:// e.g. ws://127.0.0.1:3000").ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Runtime Error").ok();
    writeln!(output).ok();
    writeln!(output, "Error: {}", error).ok();
    writeln!(output).ok();
    writeln!(output, "Troubleshooting:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Re-run with -vvv and inspect the log").ok();
    writeln!(output, "  2. Validate the configuration file").ok();
}
