//! Schema CLI commands: schema, plan, migrate.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Print the desired schema and the live table side by side.
pub async fn show_schema(state: &AppState, json: bool) -> Result<()> {
    let desired = state.store.schema();
    let live = state.store.live_schema().await?;
    let in_sync = live.as_ref() == Some(desired);

    if json {
        let out = serde_json::json!({
            "desired": desired,
            "live": live,
            "in_sync": in_sync,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {}", style("Desired").bold().underlined());
    print_indented(&desired.to_string());
    println!();
    println!("  {}", style("Live").bold().underlined());
    match &live {
        Some(schema) => print_indented(&schema.to_string()),
        None => println!("    {}", style("absent").dim()),
    }
    println!();

    if in_sync {
        println!("  {} Live table matches", style("✓").green().bold());
    } else {
        println!(
            "  {} Live table differs. Preview with: {}",
            style("!").yellow().bold(),
            style("vectable plan").yellow()
        );
    }
    println!();

    Ok(())
}

/// Print the pending migration statements without executing them.
pub async fn show_plan(state: &AppState, json: bool) -> Result<()> {
    let statements = state.store.plan_migration().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&statements)?);
        return Ok(());
    }

    println!();
    if statements.is_empty() {
        println!(
            "  {} {} is up to date",
            style("✓").green().bold(),
            style(&state.store.schema().name).cyan()
        );
    } else {
        println!(
            "  {} statements pending for {}",
            style(statements.len()).bold(),
            style(&state.store.schema().name).cyan()
        );
        println!();
        print_statements(&statements);
    }
    println!();

    Ok(())
}

pub async fn migrate(state: &AppState, json: bool) -> Result<()> {
    let report = state.store.migrate().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let table = style(&state.store.schema().name).cyan();
    println!();
    if report.is_noop() {
        println!("  {} {table} already up to date", style("✓").green().bold());
    } else {
        let verb = if report.created { "Created" } else { "Migrated" };
        println!(
            "  {} {verb} {table} ({} statements)",
            style("✓").green().bold(),
            report.statements.len()
        );
        println!();
        print_statements(&report.statements);
    }
    println!();

    Ok(())
}

fn print_statements(statements: &[String]) {
    for (i, sql) in statements.iter().enumerate() {
        println!("  {} {sql}", style(format!("{:>2}.", i + 1)).dim());
    }
}

fn print_indented(text: &str) {
    for line in text.lines() {
        println!("    {line}");
    }
}
