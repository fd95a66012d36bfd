//! `labelhub billing` commands

use super::{load, or_dash, table, Context};
use crate::api::types::BillingReportFilter;
use crate::error::{ClientError, Result};
use crate::BillingCommand;
use chrono::NaiveDate;
use colored::Colorize;

pub async fn run(ctx: &Context, command: &BillingCommand) -> Result<()> {
    match command {
        BillingCommand::Profiles => profiles(ctx).await,
        BillingCommand::RateCards => rate_cards(ctx).await,
        BillingCommand::Report { from, to, project } => {
            let filter = BillingReportFilter {
                from: parse_date("--from", from)?,
                to: parse_date("--to", to)?,
                project_id: project.clone(),
            };
            if filter.from > filter.to {
                return Err(ClientError::invalid_argument("--from must not be after --to"));
            }
            report(ctx, &filter).await
        },
    }
}

async fn profiles(ctx: &Context) -> Result<()> {
    let profiles = load(ctx.hooks.compute_profiles()).await?;
    if ctx.emit_json(&*profiles)? {
        return Ok(());
    }

    let mut table = table(vec!["ID", "Name", "GPU", "vCPUs", "Memory", "Hourly", "Available"]);
    for profile in profiles.iter() {
        let gpu = match profile.gpu_type {
            Some(ref gpu) => format!("{} x {}", profile.gpu_count, gpu),
            None => "-".to_string(),
        };
        table.add_row(vec![
            profile.id.clone(),
            profile.name.clone(),
            gpu,
            profile.vcpus.to_string(),
            format!("{} GB", profile.memory_gb),
            format!("{:.2}", profile.hourly_rate),
            if profile.available { "yes" } else { "no" }.to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

async fn rate_cards(ctx: &Context) -> Result<()> {
    let cards = load(ctx.hooks.billing_rate_cards()).await?;
    if ctx.emit_json(&*cards)? {
        return Ok(());
    }

    let mut table = table(vec!["ID", "Name", "Rate", "Unit", "From", "To"]);
    for card in cards.iter() {
        table.add_row(vec![
            card.id.clone(),
            card.name.clone(),
            format!("{:.4} {}", card.rate, card.currency),
            card.unit.clone(),
            card.effective_from.to_string(),
            or_dash(card.effective_to),
        ]);
    }
    println!("{}", table);
    Ok(())
}

async fn report(ctx: &Context, filter: &BillingReportFilter) -> Result<()> {
    let report = load(ctx.hooks.billing_report(filter)).await?;
    if ctx.emit_json(&*report)? {
        return Ok(());
    }

    let mut table = table(vec!["Date", "Project", "Description", "Quantity", "Amount"]);
    for row in &report.rows {
        table.add_row(vec![
            row.date.to_string(),
            or_dash(row.project_id.as_deref()),
            row.description.clone(),
            format!("{:.2} {}", row.quantity, row.unit),
            format!("{:.2}", row.amount),
        ]);
    }
    println!("{}", table);
    println!(
        "{} {:.2} {} ({} to {})",
        "Total:".bold(),
        report.total,
        report.currency,
        report.from,
        report.to
    );
    Ok(())
}

fn parse_date(flag: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ClientError::invalid_argument(format!("{} expects YYYY-MM-DD, got '{}'", flag, raw)))
}
