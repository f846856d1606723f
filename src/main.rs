//! Unit Converter Pro command line

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use unit_converter_pro::core::features::calculator;
use unit_converter_pro::shared::settings::AppSettings;
use unit_converter_pro::shared::types::{Category, ConvertRequest};
use unit_converter_pro::shared::{AppError, AppResult};
use unit_converter_pro::{init_tracing, AppContext};

const USAGE: &str = "\
Usage:
  unit-converter-pro units <category>
  unit-converter-pro convert <category> <value> <from> <to>
  unit-converter-pro convert currency <value> [from] [to]   (defaults from settings)
  unit-converter-pro bmi <weight_kg> <height_cm>
  unit-converter-pro emi <principal> <annual_rate_percent> <months>
  unit-converter-pro rates [base]
  unit-converter-pro watch      (stdin lines: <field> <category> <value> <from> <to>)

Categories: length weight temp volume speed data time cooking currency";

/// Unparseable numbers become NaN so the engine reports them as invalid input
fn parse_number(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn arg<'a>(args: &'a [String], index: usize) -> AppResult<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| AppError::InvalidInput(format!("missing argument\n\n{}", USAGE)))
}

async fn run(args: Vec<String>) -> AppResult<()> {
    let Some(command) = args.first().map(String::as_str) else {
        println!("{}", USAGE);
        return Ok(());
    };

    match command {
        "bmi" => {
            let report = calculator::bmi(parse_number(arg(&args, 1)?), parse_number(arg(&args, 2)?))?;
            println!("{}", calculator::format_bmi(&report));
            return Ok(());
        }
        "emi" => {
            let report = calculator::emi(
                parse_number(arg(&args, 1)?),
                parse_number(arg(&args, 2)?),
                parse_number(arg(&args, 3)?),
            )?;
            println!("{}", calculator::format_emi(&report));
            return Ok(());
        }
        "help" | "-h" | "--help" => {
            println!("{}", USAGE);
            return Ok(());
        }
        _ => {}
    }

    let settings = AppSettings::load().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load settings; using defaults");
        AppSettings::default()
    });
    let ctx = AppContext::build(settings)?;

    match command {
        "units" => {
            let response = ctx.dispatcher.units_of(arg(&args, 1)?)?;
            for unit in response.units {
                println!("{}\t{}", unit.id, unit.label);
            }
        }
        "convert" => {
            let category = arg(&args, 1)?;
            let value = parse_number(arg(&args, 2)?);
            let request = if category.parse::<Category>().ok() == Some(Category::Currency) {
                let (from, to) = ctx
                    .settings
                    .preferences
                    .currency_pair(args.get(3).map(String::as_str), args.get(4).map(String::as_str));
                ConvertRequest::new(category, value, from, to)
            } else {
                ConvertRequest::new(category, value, arg(&args, 3)?, arg(&args, 4)?)
            };
            let response = ctx.dispatcher.handle(request).await;
            println!("{}", response.formatted_result);
        }
        "rates" => {
            let base = args
                .get(1)
                .cloned()
                .unwrap_or_else(|| ctx.settings.currency.base_currency.clone())
                .to_ascii_uppercase();
            let snapshot = ctx.cache.get_rates(&base).await?;
            let age = snapshot.age(chrono::Utc::now());
            println!(
                "base {} | {} rates | fetched {} ({} min ago){}",
                snapshot.base,
                snapshot.rates.len(),
                snapshot.fetched_at.to_rfc3339(),
                age.num_minutes(),
                if ctx.cache.is_fresh(&snapshot) { "" } else { " [stale]" }
            );
        }
        "watch" => watch(&ctx).await?,
        other => {
            return Err(AppError::InvalidInput(format!("unknown command '{}'\n\n{}", other, USAGE)));
        }
    }

    Ok(())
}

/// Collect tasks that already finished without waiting on the rest
fn reap_finished(pending: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while let Some(done) = pending.try_join_next() {
        if let Err(e) = done {
            tracing::error!(error = %e, "watch task failed");
        }
        reaped += 1;
    }
    reaped
}

/// Feed stdin edits through a debounced field session
async fn watch(ctx: &AppContext) -> AppResult<()> {
    // Warm the rate cache while the first edits are typed
    ctx.cache.spawn_refresh_if_stale(&ctx.settings.currency.base_currency);

    let session = Arc::new(ctx.field_session());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        reap_finished(&mut pending);

        let parts: Vec<&str> = line.split_whitespace().collect();
        let [field, category, value, from, to] = parts.as_slice() else {
            if !parts.is_empty() {
                eprintln!("expected: <field> <category> <value> <from> <to>");
            }
            continue;
        };

        let field = field.to_string();
        let request = ConvertRequest::new(*category, parse_number(value), *from, *to);
        let session = Arc::clone(&session);
        pending.spawn(async move {
            if let Some(response) = session.submit(&field, request).await {
                println!("{}: {}", field, response.formatted_result);
            }
        });
    }

    while let Some(done) = pending.join_next().await {
        if let Err(e) = done {
            tracing::error!(error = %e, "watch task failed");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("{}", e);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(args).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_reap_finished_keeps_running_tasks() {
        let mut pending = JoinSet::new();
        for _ in 0..3 {
            pending.spawn(async {});
        }
        pending.spawn(async { tokio::time::sleep(Duration::from_secs(60)).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(reap_finished(&mut pending), 3);
        assert_eq!(pending.len(), 1);
        pending.abort_all();
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 2.5 "), 2.5);
        assert!(parse_number("abc").is_nan());
    }
}
