//! Text and CSV rendering of a [`Report`].

use chrono::NaiveDate;
use delivery_metrics::{PeriodTable, Report};
use serde::Serialize;
use std::io::Write;

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

/// Write the report as plain-text sections.
pub fn write_text<W: Write>(out: &mut W, report: &Report) -> anyhow::Result<()> {
    writeln!(out, "Delivery Percentage Dashboard")?;
    writeln!(out)?;

    writeln!(out, "Contents")?;
    writeln!(out, "  - Summary Metrics (#summary-metrics)")?;
    for table in &report.tables {
        writeln!(
            out,
            "  - {} Delivery % Table (#{})",
            table.period.label(),
            table.period.anchor()
        )?;
    }
    writeln!(out)?;

    writeln!(out, "== Summary Metrics ==")?;
    if let Some((first, last)) = report.date_bounds {
        writeln!(out, "Date range:                   {first} to {last}")?;
    }
    let s = &report.summary;
    writeln!(out, "Average Delivery % (Overall): {:.2}", s.avg_delivery_pct)?;
    writeln!(out, "Max Delivery %:               {:.2}", s.max_delivery_pct)?;
    writeln!(out, "Total Days:                   {}", s.total_days)?;
    writeln!(out, "Total Symbols:                {}", s.total_symbols)?;
    writeln!(out)?;

    if !report.spikes.is_empty() {
        writeln!(
            out,
            "!! {} spike(s) >= {}%",
            report.spikes.len(),
            report.spike_threshold_pct
        )?;
        writeln!(out, "{:<12} {:<14} {:>10}", "Date", "Symbol", "Delivery %")?;
        for spike in &report.spikes {
            writeln!(
                out,
                "{:<12} {:<14} {:>10.2}",
                spike.date.to_string(),
                spike.symbol,
                spike.delivery_pct
            )?;
        }
        writeln!(out)?;
    }

    for table in &report.tables {
        write_table(out, table, report.net_value_threshold_crore)?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_table<W: Write>(out: &mut W, table: &PeriodTable, threshold: f64) -> anyhow::Result<()> {
    writeln!(
        out,
        "== {} Delivery % (Quantities in Millions, Net Value in Crores) ==",
        table.period.label()
    )?;
    writeln!(
        out,
        "{:<12} {:<14} {:>12} {:>12} {:>10} {:>12} {:>12} {:>12}",
        "Period", "Symbol", "Traded mn", "Deliv mn", "Deliv %", "Net Cr", "Traded chg%", "Deliv chg%"
    )?;
    for row in &table.rows {
        let net = if row.net_value_flagged {
            format!("{:.2}*", row.net_value_crore)
        } else {
            format!("{:.2}", row.net_value_crore)
        };
        writeln!(
            out,
            "{:<12} {:<14} {:>12.2} {:>12.2} {:>10} {:>12} {:>12} {:>12}",
            row.period.to_string(),
            row.symbol,
            row.traded_qty_mn,
            row.deliverable_qty_mn,
            fmt_opt(row.delivery_pct),
            net,
            fmt_opt(row.traded_qty_chg_pct),
            fmt_opt(row.deliverable_qty_chg_pct),
        )?;
    }
    let flagged = table.flagged().count();
    if flagged > 0 {
        writeln!(out, "* net value above {threshold} crore ({flagged} row(s))")?;
    }
    Ok(())
}

/// Flat CSV row; the csv serializer does not support flattened structs.
#[derive(Serialize)]
struct CsvRow<'a> {
    period_type: &'static str,
    period: NaiveDate,
    symbol: &'a str,
    traded_qty: u64,
    deliverable_qty: u64,
    traded_qty_mn: f64,
    deliverable_qty_mn: f64,
    delivery_pct: Option<f64>,
    net_value: f64,
    net_value_crore: f64,
    traded_qty_chg_pct: Option<f64>,
    deliverable_qty_chg_pct: Option<f64>,
    net_value_flagged: bool,
}

/// Write every aggregate row as one CSV stream.
pub fn write_csv<W: Write>(out: W, report: &Report) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for table in &report.tables {
        let period_type = table.period.key();
        for row in &table.rows {
            writer.serialize(CsvRow {
                period_type,
                period: row.period,
                symbol: &row.symbol,
                traded_qty: row.traded_qty,
                deliverable_qty: row.deliverable_qty,
                traded_qty_mn: row.traded_qty_mn,
                deliverable_qty_mn: row.deliverable_qty_mn,
                delivery_pct: row.delivery_pct,
                net_value: row.net_value,
                net_value_crore: row.net_value_crore,
                traded_qty_chg_pct: row.traded_qty_chg_pct,
                deliverable_qty_chg_pct: row.deliverable_qty_chg_pct,
                net_value_flagged: row.net_value_flagged,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}
