use market_table_sdk::format::{
    format_large_number, format_number, format_percentage, format_price, PriceTrend,
};
use market_table_sdk::selection::{detail_entries, DetailHeader};
use market_table_sdk::{
    Currency, MarketTable, Page, SortColumn, SortDirection, TableConfig, TableSnapshot,
};
use tracing_subscriber::EnvFilter;

fn print_snapshot(snapshot: &TableSnapshot) {
    println!("\n{:-<96}", "");
    println!(
        "Coins & Markets ({}) - {}",
        snapshot.view.currency.label(),
        snapshot.window.summary()
    );
    if snapshot.is_loading() {
        println!("Loading...");
    }
    if snapshot.is_error() {
        println!(
            "Failed to fetch data: {}",
            snapshot.last_error.as_deref().unwrap_or("unknown error")
        );
    }

    let title = |column: SortColumn| match snapshot.sort {
        Some(sort) if sort.column == column => match sort.direction {
            SortDirection::Ascending => format!("{} ↑", column.title()),
            SortDirection::Descending => format!("{} ↓", column.title()),
        },
        _ => column.title().to_string(),
    };
    println!(
        "{:>4} {:<22} {:>14} {:>12} {:>22} {:>22}",
        "#",
        "Name",
        title(SortColumn::CurrentPrice),
        title(SortColumn::PriceChangePercentage24h),
        title(SortColumn::MarketCap),
        title(SortColumn::TotalVolume),
    );

    let currency = snapshot.view.currency;
    for row in snapshot.rows.iter() {
        let caret = PriceTrend::of(row.price_change_percentage_24h)
            .map(|trend| trend.caret())
            .unwrap_or(" ");
        println!(
            "{:>4} {:<22} {:>14} {:>12} {:>22} {:>22}",
            format_number(row.market_cap_rank.map(|r| r as f64)),
            format!("{} {}", row.name, row.symbol.to_uppercase()),
            format_price(currency, row.current_price),
            format!("{} {}", caret, format_percentage(row.price_change_percentage_24h)),
            format_price(currency, row.market_cap),
            format_large_number(row.total_volume),
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut table = MarketTable::new(TableConfig::from_env())?;
    let mut updates = table.subscribe();

    // Wait for the first page
    updates.wait_for(|s| !s.is_loading() && s.epoch.get() > 0).await?;
    print_snapshot(&updates.borrow_and_update());

    // Client-side sort: no refetch
    table.toggle_sort(SortColumn::PriceChangePercentage24h).await?;
    updates.changed().await?;
    print_snapshot(&updates.borrow_and_update());

    // Page and currency changes refetch
    table.set_page(Page::new(2).unwrap_or(Page::FIRST)).await?;
    table.set_currency(Currency::Eur).await?;
    updates
        .wait_for(|s| s.view.currency == Currency::Eur && !s.is_loading())
        .await?;
    let snapshot = updates.borrow_and_update().clone();
    print_snapshot(&snapshot);

    if !snapshot.rows.is_empty() {
        let row = table.select_row(0)?.clone();
        let header = DetailHeader::new(&row, snapshot.view.currency);
        println!("\n{} {} {} {}", header.name, header.symbol, header.price, header.change);
        for entry in detail_entries(&row, snapshot.view.currency) {
            println!("  {:<24} {}", entry.title, entry.value);
        }
        table.dismiss_detail();
    }

    let stats = table.fetch_stats();
    println!(
        "\nProvider {}: p50={:.0}ms p99={:.0}ms success_rate={:.1}% discarded={}",
        stats.provider_name,
        stats.latency_p50_ms,
        stats.latency_p99_ms,
        stats.success_rate * 100.0,
        stats.discarded_results
    );

    table.shutdown().await;
    Ok(())
}
