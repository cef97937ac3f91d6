use crate::utils;
use colored::Colorize;
use provflow_resources::{KINDS, KindInfo, find_kind};

pub fn handle(kind: Option<&str>) -> anyhow::Result<()> {
    match kind {
        Some(name) => {
            let info = find_kind(name).ok_or_else(|| {
                anyhow::anyhow!(
                    "リソース種別 '{}' が見つかりません。利用可能な種別: {}",
                    name,
                    KINDS.iter().map(|k| k.name).collect::<Vec<_>>().join(", ")
                )
            })?;
            print_kind(info);
        }
        None => print_summary(),
    }
    Ok(())
}

fn print_summary() {
    println!(
        "{}",
        format!(
            "{:<18} {:<8} {:<8} {:<8} {}",
            "KIND", "CREATE", "UPDATE", "DELETE", "DESCRIPTION"
        )
        .bold()
    );
    println!("{}", "─".repeat(80).dimmed());

    for info in KINDS {
        println!(
            "{} {:<8} {:<8} {:<8} {}",
            format!("{:<18}", info.name).cyan(),
            utils::format_timeout(info.create_timeout),
            utils::format_timeout(info.update_timeout),
            utils::format_timeout(info.delete_timeout),
            info.description.dimmed()
        );
    }

    println!();
    println!(
        "{}",
        "各ステータスの分類は `provflow kinds <KIND>` で確認できます".dimmed()
    );
}

fn print_kind(info: &KindInfo) {
    println!("{} {}", info.name.cyan().bold(), info.description.dimmed());
    println!(
        "  タイムアウト: 作成 {}, 更新 {}, 削除 {}",
        utils::format_timeout(info.create_timeout),
        utils::format_timeout(info.update_timeout),
        utils::format_timeout(info.delete_timeout)
    );
    println!();
    println!(
        "{}",
        format!("  {:<26} {:<12} {}", "STATUS", "PHASE", "DELETE PHASE").bold()
    );

    for row in info.statuses() {
        println!(
            "  {:<26} {} {}",
            row.status,
            utils::phase_colored(row.phase, 12),
            utils::phase_colored(row.delete_phase, 0)
        );
    }
}
