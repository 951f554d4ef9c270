use console::style;

use crate::config::DownloadConfig;

/// Print the startup banner with the active download policy
pub fn print_banner(url: &str, localhost_url: &str, config: &DownloadConfig) {
    let methods = match (config.allow_get, config.allow_post) {
        (true, true) => "GET, POST",
        (true, false) => "GET",
        (false, true) => "POST",
        (false, false) => "none",
    };
    let served_dir = config.served_dir();
    let mode = if config.strict_containment {
        "prefix + canonical containment"
    } else {
        "prefix"
    };

    eprintln!();
    eprintln!("{}", style(r#"   ___  __ _ / _| ___  __| | |"#).bold().green());
    eprintln!("{}", style(r#"  / __|/ _` | |_ / _ \/ _` | |"#).bold().green());
    eprintln!("{}", style(r#"  \__ \ (_| |  _|  __/ (_| | |"#).bold().green());
    eprintln!("{}", style(r#"  |___/\__,_|_|  \___|\__,_|_|"#).bold().green());
    eprintln!("{}", style("      allow-listed file downloads").dim());
    eprintln!();

    eprintln!("  {}", style("─".repeat(50)).dim());
    eprintln!();
    eprintln!(
        "  {}  {}",
        style("URL").bold().cyan(),
        style(url).underlined().cyan()
    );
    eprintln!();
    eprintln!(
        "  {}  {}",
        style("├─ Directory").dim(),
        style(served_dir.display()).white().bold()
    );
    eprintln!(
        "  {}  {}",
        style("├─ Extensions").dim(),
        style(config.allowed_extensions.join(" ")).white()
    );
    eprintln!("  {}  {}", style("├─ Methods").dim(), style(methods).yellow());
    eprintln!("  {}  {}", style("├─ Checks").dim(), style(mode).white());
    eprintln!(
        "  {}  {}",
        style("└─ Failure status").dim(),
        style(config.failure_status.as_u16()).dim()
    );
    eprintln!();
    eprintln!(
        "  {} Also available at: {}",
        style("ℹ").blue(),
        style(localhost_url).dim()
    );
    eprintln!("  {} Waiting for requests... (Ctrl+C to stop)", style("⏳").dim());
    eprintln!();
}

pub fn print_shutdown() {
    eprintln!();
    eprintln!("  {} {}", style("🛑").bold(), style("Shutting down...").yellow());
    eprintln!();
}
