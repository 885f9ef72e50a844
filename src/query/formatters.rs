use crate::query::OwnedTokens;
use crate::repository::WalletCheckpoint;
use comfy_table::{Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use csv::Writer;
use serde_json::json;

#[derive(Debug, Clone)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Table,
        }
    }
}

fn block_label(block: Option<u64>) -> String {
    block.map_or_else(|| "never".to_string(), |b| b.to_string())
}

pub fn format_owned_tokens(owned: &OwnedTokens, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut summary = Table::new();
            summary
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec!["Wallet", "Last Scanned Block", "Tokens"]);
            summary.add_row(vec![
                Cell::new(format!("{:?}", owned.wallet)),
                Cell::new(block_label(owned.last_scanned_block)),
                Cell::new(owned.token_ids.len()),
            ]);

            if owned.token_ids.is_empty() {
                return format!("{summary}\nNo tokens held.");
            }

            let mut tokens = Table::new();
            tokens
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec!["#", "Token ID"]);
            for (i, id) in owned.token_ids.iter().enumerate() {
                tokens.add_row(vec![Cell::new(i + 1), Cell::new(id.to_string())]);
            }

            format!("{summary}\n{tokens}")
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(owned).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record(["wallet", "last_scanned_block", "token_id"]);

            let wallet = format!("{:?}", owned.wallet);
            let block = owned
                .last_scanned_block
                .map(|b| b.to_string())
                .unwrap_or_default();
            for id in &owned.token_ids {
                let id = id.to_string();
                let _ = wtr.write_record([wallet.as_str(), block.as_str(), id.as_str()]);
            }

            String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
        }
    }
}

pub fn format_checkpoints(checkpoints: &[WalletCheckpoint], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            if checkpoints.is_empty() {
                return "No wallets indexed yet.".to_string();
            }

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec!["Wallet", "Last Scanned Block", "Tokens"]);
            for cp in checkpoints {
                table.add_row(vec![
                    Cell::new(format!("{:?}", cp.wallet)),
                    Cell::new(block_label(cp.last_scanned_block)),
                    Cell::new(cp.token_ids.len()),
                ]);
            }

            table.to_string()
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(checkpoints).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record(["wallet", "last_scanned_block", "token_count"]);
            for cp in checkpoints {
                let _ = wtr.write_record([
                    &format!("{:?}", cp.wallet),
                    &cp.last_scanned_block
                        .map(|b| b.to_string())
                        .unwrap_or_default(),
                    &cp.token_ids.len().to_string(),
                ]);
            }

            String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
        }
    }
}

pub fn format_head(block: u64, endpoints: usize, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec!["Metric", "Value"]);
            table.add_row(vec![Cell::new("Latest Block"), Cell::new(block)]);
            table.add_row(vec![Cell::new("RPC Endpoints"), Cell::new(endpoints)]);
            table.to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "latestBlock": block,
            "endpoints": endpoints,
        }))
        .unwrap_or_else(|_| "{}".to_string()),
        OutputFormat::Csv => format!("latest_block,endpoints\n{block},{endpoints}\n"),
    }
}
