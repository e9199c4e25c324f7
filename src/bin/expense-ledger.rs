//! CLI binary for recording and reviewing expenses and incomes.

use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use expense_ledger::backup::{ImportReport, backup_file_name};
use expense_ledger::models::{
    BalanceSummary, Category, CategoryStatistic, Expense, ExpenseRecord, Income, MonthlyStatistic,
    PeriodComparison,
};
use expense_ledger::period::{DateRange, Period};
use expense_ledger::storage::{FileStorage, KeyValueStore};
use expense_ledger::tracker::Tracker;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Expense ledger: record spending and income, review statistics, and
/// back up your data.
#[derive(Debug, Parser)]
#[command(name = "expense-ledger", version, about)]
struct Cli {
    /// Override the storage directory (default: XDG data dir).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// List categories in display order.
    Categories,
    /// Add a spending category.
    AddCategory {
        /// Display name.
        #[arg(long)]
        name: String,
        /// Hex color, e.g. `#FF6B6B`.
        #[arg(long, default_value = "#CCCCCC")]
        color: String,
        /// Display icon, usually an emoji.
        #[arg(long, default_value = "\u{1f4cc}")]
        icon: String,
    },
    /// Record an expense.
    AddExpense {
        /// Amount spent (positive).
        #[arg(long, value_parser = parse_amount)]
        amount: f64,
        /// Category name (case-insensitive).
        #[arg(long)]
        category: String,
        /// Date (YYYY-MM-DD, default: now).
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Optional note.
        #[arg(long)]
        note: Option<String>,
    },
    /// Record an income.
    AddIncome {
        /// Amount received (positive).
        #[arg(long, value_parser = parse_amount)]
        amount: f64,
        /// Date (YYYY-MM-DD, default: now).
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Optional note, e.g. the income source.
        #[arg(long)]
        note: Option<String>,
    },
    /// List expenses, optionally limited to a period or date range.
    Expenses(RangeArgs),
    /// Show category breakdown, monthly totals, period comparison and
    /// balance.
    Stats(RangeArgs),
    /// Write a backup file.
    Export {
        /// Directory to write into (default: current directory).
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
    /// Replace all data with the contents of a backup file.
    Import {
        /// Backup file to read.
        file: PathBuf,
    },
}

/// Relative periods selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PeriodArg {
    /// The last 7 days.
    Week,
    /// The last calendar month.
    Month,
    /// The last 12 calendar months.
    Year,
}

impl From<PeriodArg> for Period {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Week => Self::ThisWeek,
            PeriodArg::Month => Self::ThisMonth,
            PeriodArg::Year => Self::ThisYear,
        }
    }
}

/// Date selection shared by `expenses` and `stats`.
#[derive(Debug, Args)]
struct RangeArgs {
    /// Relative period ending now.
    #[arg(long, value_enum, conflicts_with_all = ["from", "to"])]
    period: Option<PeriodArg>,
    /// Start date (inclusive, YYYY-MM-DD). Requires --to.
    #[arg(long, requires = "to", value_parser = parse_date)]
    from: Option<NaiveDate>,
    /// End date (inclusive, YYYY-MM-DD). Requires --from.
    #[arg(long, requires = "from", value_parser = parse_date)]
    to: Option<NaiveDate>,
}

/// Parses a date string in `YYYY-MM-DD` format for clap.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|err| format!("{err}"))
}

/// Parses an amount for clap, rejecting anything not finite and positive.
fn parse_amount(s: &str) -> Result<f64, String> {
    let amount: f64 = s.trim().parse().map_err(|err| format!("{err}"))?;
    if amount.is_finite() && amount > 0.0_f64 {
        Ok(amount)
    } else {
        Err(format!("amount must be a positive number, got {s}"))
    }
}

/// First instant of `day`, in UTC.
fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Last second of `day`, in UTC.
fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(23, 59, 59)
        .map_or_else(|| start_of_day(day), |naive| naive.and_utc())
}

/// Resolves range arguments to a window, or `None` for "all time".
fn resolve_range(args: &RangeArgs, now: DateTime<Utc>) -> Option<DateRange> {
    if let Some(period) = args.period {
        return Some(Period::from(period).resolve_at(now));
    }
    args.from
        .zip(args.to)
        .map(|(from, to)| DateRange::new(start_of_day(from), end_of_day(to)))
}

/// Timestamp for a user-supplied date, or now.
fn entry_date(date: Option<NaiveDate>) -> DateTime<Utc> {
    date.map_or_else(Utc::now, start_of_day)
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let storage = match create_storage(cli.data_dir) {
        Ok(storage) => storage,
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to initialize storage: {err}",
                "error:".red().bold()
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut tracker = match Tracker::builder().storage(storage).build() {
        Ok(tracker) => tracker,
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to load ledger: {err}",
                "error:".red().bold()
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };

    dispatch(&mut tracker, cli.command)
}

/// Creates the storage backend, using `data_dir` if provided or the
/// default XDG data directory otherwise.
fn create_storage(data_dir: Option<PathBuf>) -> expense_ledger::error::Result<FileStorage> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => FileStorage::default_dir()?,
    };
    FileStorage::new(dir)
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch<S: KeyValueStore>(tracker: &mut Tracker<S>, command: Command) -> io::Result<ExitCode> {
    match command {
        Command::Categories => {
            print_categories_table(tracker.categories())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::AddCategory { name, color, icon } => {
            cmd_add_category(tracker, Category::new(name, color, icon))
        }
        Command::AddExpense {
            amount,
            category,
            date,
            note,
        } => cmd_add_expense(tracker, amount, &category, entry_date(date), note),
        Command::AddIncome { amount, date, note } => {
            cmd_add_income(tracker, Income::new(amount, entry_date(date), note))
        }
        Command::Expenses(args) => {
            let expenses = match resolve_range(&args, Utc::now()) {
                Some(range) => tracker.expenses_in_range(range),
                None => tracker.expenses(),
            };
            print_expenses_table(&expenses)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Stats(args) => cmd_stats(tracker, &args, Utc::now()),
        Command::Export { out } => {
            let dir = out.unwrap_or_else(|| PathBuf::from("."));
            cmd_export(tracker, &dir, Utc::now())
        }
        Command::Import { file } => cmd_import(tracker, &file),
    }
}

/// Prints a save/validation failure and returns a failing exit code.
fn report_failure(action: &str, err: &expense_ledger::error::LedgerError) -> io::Result<ExitCode> {
    writeln!(
        io::stderr().lock(),
        "{} {action}: {err}",
        "error:".red().bold()
    )?;
    Ok(ExitCode::FAILURE)
}

/// Executes the `add-category` subcommand.
fn cmd_add_category<S: KeyValueStore>(
    tracker: &mut Tracker<S>,
    category: Category,
) -> io::Result<ExitCode> {
    let name = category.name.clone();
    match tracker.add_category(category) {
        Ok(()) => {
            writeln!(io::stdout().lock(), "{} {name}", "Added category".green().bold())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure("failed to add category", &err),
    }
}

/// Executes the `add-expense` subcommand, resolving the category by name.
fn cmd_add_expense<S: KeyValueStore>(
    tracker: &mut Tracker<S>,
    amount: f64,
    category_name: &str,
    date: DateTime<Utc>,
    note: Option<String>,
) -> io::Result<ExitCode> {
    let Some(category) = tracker.category_store().find_by_name(category_name) else {
        writeln!(
            io::stderr().lock(),
            "{} category not found: {category_name}",
            "error:".red().bold()
        )?;
        return Ok(ExitCode::FAILURE);
    };
    let label = format!("{} {}", category.icon, category.name);
    let record = ExpenseRecord::new(amount, category.id, date, note);
    match tracker.add_expense(record) {
        Ok(()) => {
            writeln!(
                io::stdout().lock(),
                "{} {amount:.2} {}",
                "Added expense".green().bold(),
                format!("({label})").dimmed()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure("failed to add expense", &err),
    }
}

/// Executes the `add-income` subcommand.
fn cmd_add_income<S: KeyValueStore>(tracker: &mut Tracker<S>, income: Income) -> io::Result<ExitCode> {
    let amount = income.amount;
    match tracker.add_income(income) {
        Ok(()) => {
            writeln!(io::stdout().lock(), "{} {amount:.2}", "Added income".green().bold())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure("failed to add income", &err),
    }
}

/// Executes the `stats` subcommand.
fn cmd_stats<S: KeyValueStore>(
    tracker: &Tracker<S>,
    args: &RangeArgs,
    now: DateTime<Utc>,
) -> io::Result<ExitCode> {
    let range = resolve_range(args, now)
        .unwrap_or_else(|| DateRange::new(DateTime::<Utc>::MIN_UTC, now));

    print_breakdown_table(&tracker.category_breakdown(range))?;
    print_monthly_table(&tracker.monthly_expenses(range))?;
    if let Some(period) = args.period {
        let comparison = tracker.compare_with_previous_at(period.into(), now);
        print_comparison(&comparison)?;
    }
    print_balance(&tracker.balance(range))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `export` subcommand: writes a timestamped backup file.
fn cmd_export<S: KeyValueStore>(
    tracker: &Tracker<S>,
    dir: &Path,
    now: DateTime<Utc>,
) -> io::Result<ExitCode> {
    let spinner = make_spinner("Exporting backup...");
    let path = dir.join(backup_file_name(now));
    let outcome = tracker
        .export_backup_at(now)
        .to_json_pretty()
        .map_err(|err| err.to_string())
        .and_then(|json| std::fs::write(&path, json).map_err(|err| err.to_string()));
    spinner.finish_and_clear();

    match outcome {
        Ok(()) => {
            writeln!(
                io::stdout().lock(),
                "{} {}",
                "Exported".green().bold(),
                path.display()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::debug!(error = %err, path = %path.display(), "export failed");
            writeln!(io::stderr().lock(), "{} could not export", "error:".red().bold())?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Executes the `import` subcommand: replaces all data from a backup.
fn cmd_import<S: KeyValueStore>(tracker: &mut Tracker<S>, file: &Path) -> io::Result<ExitCode> {
    let spinner = make_spinner("Importing backup...");
    let outcome = std::fs::read(file)
        .map_err(|err| err.to_string())
        .and_then(|bytes| tracker.import_backup(&bytes).map_err(|err| err.to_string()));
    spinner.finish_and_clear();

    match outcome {
        Ok(report) => {
            print_import_report(&report)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::debug!(error = %err, file = %file.display(), "import failed");
            writeln!(
                io::stderr().lock(),
                "{} could not import \u{2014} check file format",
                "error:".red().bold()
            )?;
            Ok(ExitCode::FAILURE)
        }
    }
}

// ── Output formatting ────────────────────────────────────────────────

/// Builds a table with the shared preset and a cyan header row.
fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(
        headers
            .iter()
            .map(|header| Cell::new(header).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    table
}

/// Prints categories in a table.
fn print_categories_table(categories: &[Category]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if categories.is_empty() {
        writeln!(out, "{}", "No categories found.".dimmed())?;
        return Ok(());
    }

    let mut table = new_table(&["Icon", "Name", "Color"]);
    for category in categories {
        _ = table.add_row(vec![
            Cell::new(&category.icon),
            Cell::new(&category.name),
            Cell::new(&category.color),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Categories".green().bold(),
        format_args!("({})", categories.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints expenses in a table.
fn print_expenses_table(expenses: &[Expense]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if expenses.is_empty() {
        writeln!(out, "{}", "No expenses found.".dimmed())?;
        return Ok(());
    }

    let mut table = new_table(&["Date", "Category", "Amount", "Note"]);
    for expense in expenses {
        _ = table.add_row(vec![
            Cell::new(expense.date.format("%Y-%m-%d %H:%M")),
            Cell::new(format!("{} {}", expense.category.icon, expense.category.name)),
            Cell::new(format!("{:.2}", expense.amount)).fg(Color::Red),
            Cell::new(expense.note.as_deref().unwrap_or("")),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Expenses".green().bold(),
        format_args!("({})", expenses.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints the per-category breakdown.
fn print_breakdown_table(stats: &[CategoryStatistic]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if stats.is_empty() {
        writeln!(out, "{}", "No spending in this period.".dimmed())?;
        return Ok(());
    }

    let mut table = new_table(&["Category", "Total", "Share"]);
    for stat in stats {
        _ = table.add_row(vec![
            Cell::new(format!("{} {}", stat.category.icon, stat.category.name)),
            Cell::new(format!("{:.2}", stat.total)),
            Cell::new(format!("{:.1}%", stat.percentage)),
        ]);
    }

    writeln!(out, "{}", "By category".green().bold())?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints monthly totals.
fn print_monthly_table(months: &[MonthlyStatistic]) -> io::Result<()> {
    if months.is_empty() {
        return Ok(());
    }
    let mut out = io::stdout().lock();
    let mut table = new_table(&["Month", "Total"]);
    for month in months {
        _ = table.add_row(vec![
            Cell::new(month.month.format("%Y-%m")),
            Cell::new(format!("{:.2}", month.total)),
        ]);
    }
    writeln!(out, "{}", "By month".green().bold())?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints the comparison with the preceding period.
fn print_comparison(comparison: &PeriodComparison) -> io::Result<()> {
    let change = format!("{:+.1}%", comparison.percent_change);
    let mut out = io::stdout().lock();
    write!(
        out,
        "{} {:.2} vs {:.2} ",
        "Compared to previous period:".bold(),
        comparison.current,
        comparison.previous
    )?;
    if comparison.percent_change > 0.0_f64 {
        writeln!(out, "{}", change.red())?;
    } else {
        writeln!(out, "{}", change.green())?;
    }
    Ok(())
}

/// Prints income against spending.
fn print_balance(summary: &BalanceSummary) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let balance = format!("{:.2}", summary.balance);
    writeln!(
        out,
        "{} income {:.2}, expenses {:.2}, balance {}",
        "Balance:".bold(),
        summary.income_total,
        summary.expense_total,
        if summary.balance < 0.0_f64 {
            balance.red().to_string()
        } else {
            balance.green().to_string()
        }
    )?;
    Ok(())
}

/// Prints what an import restored and what it skipped.
fn print_import_report(report: &ImportReport) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", "Import complete!".green().bold())?;
    writeln!(out)?;

    let mut table = new_table(&["Entity", "Imported"]);
    for (name, count) in [
        ("Categories", report.categories_imported),
        ("Expenses", report.expenses_imported),
        ("Incomes", report.incomes_imported),
    ] {
        _ = table.add_row(vec![Cell::new(name), Cell::new(count).fg(Color::Green)]);
    }
    writeln!(out, "{table}")?;

    if !report.is_complete() {
        writeln!(
            out,
            "{} {}",
            "Skipped".yellow().bold(),
            format_args!("({})", report.skipped.len()).dimmed()
        )?;
        let mut skipped = new_table(&["Kind", "Id", "Reason"]);
        for record in &report.skipped {
            _ = skipped.add_row(vec![
                Cell::new(record.kind),
                Cell::new(&record.id),
                Cell::new(&record.reason).fg(Color::Yellow),
            ]);
        }
        writeln!(out, "{skipped}")?;
    }
    Ok(())
}

/// Creates a spinner with the given message.
fn make_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(core::time::Duration::from_millis(80));
    spinner
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}
