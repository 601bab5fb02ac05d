//! # Seed Data Generator
//!
//! Populates a development database with a small restaurant: ingredients,
//! technical sheets, costing settings and a few months of cash entries.
//!
//! ## Usage
//! ```bash
//! # Default database ./larder_dev.db, 3 months of ledger
//! cargo run -p larder-db --bin seed
//!
//! # Custom path and ledger length
//! cargo run -p larder-db --bin seed -- --db ./data/larder.db --months 6
//! ```

use chrono::{Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::env;

use larder_core::{
    CashCategory, CostingConfig, CostingSettings, Money, Unit, DEFAULT_TENANT_ID,
};
use larder_db::{Database, DbConfig};

/// (name, unit, price in cents per unit, correction factor in hundredths)
const INGREDIENTS: &[(&str, Unit, i64, i64)] = &[
    ("Feijão preto", Unit::Kg, 899, 100),
    ("Costela suína", Unit::Kg, 2490, 125),
    ("Linguiça calabresa", Unit::Kg, 2290, 100),
    ("Arroz branco", Unit::Kg, 549, 100),
    ("Cebola", Unit::Kg, 599, 110),
    ("Alho", Unit::Kg, 3990, 120),
    ("Couve", Unit::Kg, 1290, 140),
    ("Laranja", Unit::Kg, 449, 160),
    ("Farinha de mandioca", Unit::Kg, 799, 100),
    ("Azeite", Unit::L, 4990, 100),
    ("Ovo", Unit::Unit, 85, 100),
    ("Leite condensado", Unit::G, 2, 100),
];

/// (name, yield, [(ingredient index, net quantity in thousandths)])
const SHEETS: &[(&str, i64, &[(usize, i64)])] = &[
    (
        "Feijoada completa",
        8,
        &[(0, 1000), (1, 600), (2, 400), (4, 200), (5, 30), (6, 300), (7, 500), (8, 200)],
    ),
    ("Arroz branco", 6, &[(3, 500), (4, 50), (5, 10), (9, 30)]),
    ("Farofa de ovo", 4, &[(8, 250), (10, 3000), (4, 80), (9, 20)]),
    ("Pudim", 10, &[(10, 5000), (11, 395)]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut months: u32 = 3;
    let mut db_path = String::from("./larder_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--months" | "-m" => {
                if i + 1 < args.len() {
                    months = args[i + 1].parse().unwrap_or(3);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Larder Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -m, --months <N>   Months of cash entries to generate (default: 3)");
                println!("  -d, --db <PATH>    Database file path (default: ./larder_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Larder Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Months:   {}", months);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.ingredients().count(DEFAULT_TENANT_ID).await?;
    if existing > 0 {
        println!("⚠ Database already has {} ingredients", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Settings: 18k fixed per month over 2,400 dishes, 6% tax
    db.settings()
        .upsert(&CostingSettings {
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            config: CostingConfig {
                standard_markup_percent: Decimal::from(300),
                monthly_fixed_expense: Decimal::from(18_000),
                monthly_dishes_sold: 2_400,
                safety_margin_percent: Decimal::from(5),
                tax_percent: Decimal::from(6),
                variable_expense_percent: Decimal::new(35, 1),
            },
            updated_at: None,
        })
        .await?;
    println!("✓ Costing settings saved");

    let mut ingredient_ids = Vec::with_capacity(INGREDIENTS.len());
    for (name, unit, price_cents, factor) in INGREDIENTS {
        let ingredient = db
            .ingredients()
            .create(
                DEFAULT_TENANT_ID,
                name,
                *unit,
                Decimal::new(*price_cents, 2),
                Decimal::new(*factor, 2),
            )
            .await?;
        ingredient_ids.push(ingredient.id);
    }
    println!("✓ Created {} ingredients", ingredient_ids.len());

    println!();
    for (name, yield_portions, items) in SHEETS {
        let sheet = db
            .sheets()
            .create(DEFAULT_TENANT_ID, name, *yield_portions, None)
            .await?;
        for (index, thousandths) in items.iter() {
            db.sheets()
                .add_item(&sheet.id, &ingredient_ids[*index], Decimal::new(*thousandths, 3))
                .await?;
        }

        let costing = db.sheet_costing(&sheet.id).await?;
        println!(
            "  {:<20} cost {:>8} price {:>8} ({})",
            name,
            costing.result.final_cost.round_dp(2),
            costing.result.suggested_price.round_dp(2),
            costing.result.viability.as_str()
        );
    }
    println!("✓ Created {} technical sheets", SHEETS.len());

    let today = Utc::now().date_naive();
    let first_month = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
        .and_then(|d| d.checked_sub_months(Months::new(months.saturating_sub(1))))
        .ok_or("invalid start month")?;

    let mut generated = 0;
    for m in 0..months {
        let Some(month_start) = first_month.checked_add_months(Months::new(m)) else {
            break;
        };
        let day = |d: u32| NaiveDate::from_ymd_opt(month_start.year(), month_start.month(), d);
        // Revenue drifts upwards month over month
        let sales = 5_800_000 + i64::from(m) * 250_000;

        let entries = [
            (CashCategory::Rent, "Aluguel", 650_000, day(5)),
            (CashCategory::Payroll, "Folha", 980_000, day(5)),
            (CashCategory::Utilities, "Luz e gás", 145_000, day(10)),
            (CashCategory::Ingredients, "Compras da semana", sales * 30 / 100, day(15)),
            (CashCategory::Marketing, "Anúncios", 60_000, day(20)),
            (CashCategory::Sales, "Vendas do mês", sales, day(28)),
            (CashCategory::SalesTax, "Simples Nacional", sales * 6 / 100, day(28)),
        ];

        for (category, description, cents, date) in entries {
            let Some(date) = date else { continue };
            db.cash_entries()
                .create(DEFAULT_TENANT_ID, category, description, Money::from_cents(cents), date)
                .await?;
            generated += 1;
        }
    }
    println!("✓ Recorded {} cash entries", generated);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
