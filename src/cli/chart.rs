use super::ui;
use crate::core::chart::{ChartData, ChartKind, ChartRequest, build_chart};
use crate::core::display::DisplayMode;
use crate::core::rates::RateTable;
use crate::core::series::{AccountHistoryProvider, NoticeReason, format_instant};
use anyhow::Result;
use comfy_table::Cell;

impl ChartData {
    pub fn display_as_table(&self) -> String {
        let mut output = format!(
            "{} — {}\n\n",
            ui::style_text(self.kind.title(), ui::StyleType::Title),
            mode_description(self)
        );

        if self.timeline.is_empty() {
            output.push_str(&ui::style_text("No data to display.", ui::StyleType::Subtle));
            return output;
        }

        let signed = matches!(self.kind, ChartKind::MonthlyPnl | ChartKind::CumulativePnl);

        let mut table = ui::new_styled_table();
        let mut header = vec![ui::header_cell("Date")];
        for name in &self.account_names {
            header.push(ui::header_cell(name));
        }
        if self.show_total {
            header.push(ui::header_cell("Total"));
        }
        table.set_header(header);

        for point in &self.timeline.points {
            let mut row = vec![Cell::new(format_instant(&point.date))];
            for name in &self.account_names {
                let value = point.values.get(name).copied();
                row.push(if signed {
                    ui::signed_cell(value)
                } else {
                    ui::value_cell(value)
                });
            }
            if self.show_total {
                row.push(ui::total_cell(point.total));
            }
            table.add_row(row);
        }
        output.push_str(&table.to_string());

        let [low, high] = self.domain;
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(&format!("Domain: [{low:.2}, {high:.2}]"), ui::StyleType::Subtle)
        ));

        if !self.timeline.notices.is_empty() {
            output.push_str(&format!(
                "\n{}",
                ui::style_text("Notices:", ui::StyleType::Error)
            ));
            for notice in &self.timeline.notices {
                let reason = match notice.reason {
                    NoticeReason::MissingRate => "missing exchange rate",
                    NoticeReason::MalformedDate => "malformed date",
                };
                output.push_str(&format!(
                    "\n  account {} @ {}: {}",
                    notice.account_id, notice.date, reason
                ));
            }
        }

        output
    }
}

fn mode_description(chart: &ChartData) -> String {
    let currency = chart.display.currency.as_deref();
    match chart.display.mode {
        DisplayMode::AllConverted => {
            format!("all accounts, converted to {}", currency.unwrap_or("?"))
        }
        DisplayMode::SingleNative if chart.display.convert => {
            format!("one account, converted to {}", currency.unwrap_or("?"))
        }
        DisplayMode::SingleNative => match currency {
            Some(code) => format!("one account, native {code}"),
            None => "one account, no currency metadata".to_string(),
        },
        DisplayMode::MultiSameCurrencyNative if chart.display.convert => {
            format!("selected accounts, converted to {}", currency.unwrap_or("?"))
        }
        DisplayMode::MultiSameCurrencyNative => match currency {
            Some(code) => format!("selected accounts, native {code}"),
            None => "selected accounts, no currency metadata".to_string(),
        },
        DisplayMode::MultiMixedConverted => format!(
            "selected accounts, mixed currencies, converted to {}",
            currency.unwrap_or("?")
        ),
    }
}

pub async fn run(
    provider: &(dyn AccountHistoryProvider),
    rates: &RateTable,
    kind: ChartKind,
    selection: &[i64],
    target_currency: &str,
    show_converted: bool,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching account history...");
    let accounts = provider.fetch_accounts().await?;
    pb.finish_and_clear();

    let request = ChartRequest {
        kind,
        selection,
        target_currency,
        show_converted,
    };
    let chart = build_chart(&accounts, rates, &request);

    println!("{}", chart.display_as_table());
    Ok(())
}
