use crate::utils;
use colored::Colorize;
use provflow_resources::KINDS;

pub fn handle() -> anyhow::Result<()> {
    let loaded = provflow_config::load()?;
    let settings = &loaded.settings;

    match &loaded.source {
        Some(path) => println!("設定ファイル: {}", path.display().to_string().cyan()),
        None => println!("{}", "設定ファイルが見つからないため、デフォルト値を使用します".dimmed()),
    }
    println!(
        "  ポーリング間隔:     {}",
        utils::format_duration(settings.poll_interval())
    );
    println!(
        "  一時エラー再試行数: {}",
        settings.max_transient_retries
    );
    println!();

    println!(
        "{}",
        format!("{:<18} {:<8} {:<8} {:<8}", "KIND", "CREATE", "UPDATE", "DELETE").bold()
    );
    println!("{}", "─".repeat(45).dimmed());

    for info in KINDS {
        let overridden = settings.kinds.contains_key(info.name);
        let name = format!("{:<18}", info.name);
        println!(
            "{} {:<8} {:<8} {:<8}{}",
            if overridden { name.yellow() } else { name.cyan() },
            utils::format_duration(settings.create_timeout(info.name, info.create_timeout)),
            utils::format_duration(settings.update_timeout(info.name, info.update_timeout)),
            utils::format_timeout(settings.delete_timeout(info.name, info.delete_timeout)),
            if overridden { " (上書き)".dimmed() } else { "".normal() }
        );
    }

    let unknown: Vec<_> = settings
        .kinds
        .keys()
        .filter(|name| provflow_resources::find_kind(name).is_none())
        .collect();
    if !unknown.is_empty() {
        println!();
        for name in unknown {
            println!(
                "{} 不明な種別 '{}' の上書き設定は無視されます",
                "⚠".yellow(),
                name
            );
        }
    }

    Ok(())
}
