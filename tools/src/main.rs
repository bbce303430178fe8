//! spin-runner: headless runner for the lucky spin allocation engine.
//!
//! Usage:
//!   spin-runner --spins 50 --db spins.db
//!   spin-runner --seed 42 --spins 200
//!   spin-runner --db spins.db --cmd-mode

use anyhow::Result;
use luckyspin_core::{
    config::EngineConfig,
    engine::SpinEngine,
    prize::PrizeUpdate,
    store::SqliteStore,
};
use std::collections::BTreeMap;
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RunnerCommand {
    Spin,
    GetState,
    UpdatePrize {
        id: u32,
        #[serde(flatten)]
        fields: PrizeUpdate,
    },
    Schedule {
        spin_number: u64,
        prize_id: u32,
    },
    Unschedule {
        spin_number: u64,
    },
    Reset,
    Quit,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct UiState {
    spin_number: u64,
    total_budget: u64,
    spent_amount: u64,
    remaining_budget: u64,
    prizes: Vec<luckyspin_core::prize::Prize>,
    history_len: usize,
    last_outcome: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", chrono::Utc::now().timestamp() as u64);
    let spins = parse_arg(&args, "--spins", 10u64);
    let cmd_mode = args.iter().any(|a| a == "--cmd-mode");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let config = match args.windows(2).find(|w| w[0] == "--config") {
        Some(w) => EngineConfig::load(&w[1])?,
        None => EngineConfig::default(),
    };

    if !cmd_mode {
        println!("Lucky Spin — spin-runner");
        println!("  seed:  {seed}");
        println!("  spins: {spins}");
        println!("  db:    {db}");
        println!();
    }

    let store = if db == ":memory:" {
        SqliteStore::in_memory()?
    } else {
        SqliteStore::open(db)?
    };
    store.migrate()?;

    let mut engine = SpinEngine::load(Box::new(store), config, seed)?;

    if cmd_mode {
        run_cmd_loop(&mut engine)?;
    } else {
        run_batch(&mut engine, spins)?;
    }

    Ok(())
}

/// Read one JSON command per stdin line, write one JSON response per
/// line. The shell a front-end drives.
fn run_cmd_loop(engine: &mut SpinEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: RunnerCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let response = match cmd {
            RunnerCommand::Quit => break,
            RunnerCommand::Spin => match engine.spin() {
                Ok(outcome) => serde_json::json!({
                    "prize": outcome.prize,
                    "spinNumber": outcome.spin_number,
                    "persisted": outcome.persisted,
                }),
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
            RunnerCommand::GetState => serde_json::to_value(build_ui_state(engine))?,
            RunnerCommand::UpdatePrize { id, fields } => {
                reply(engine.update_prize(id, &fields))
            }
            RunnerCommand::Schedule {
                spin_number,
                prize_id,
            } => reply(engine.schedule_spin(spin_number, prize_id)),
            RunnerCommand::Unschedule { spin_number } => {
                reply(engine.unschedule_spin(spin_number))
            }
            RunnerCommand::Reset => reply(engine.reset()),
        };

        writeln!(stdout, "{}", response)?;
        stdout.flush()?;
    }
    Ok(())
}

fn reply(result: luckyspin_core::error::EngineResult<()>) -> serde_json::Value {
    match result {
        Ok(()) => serde_json::json!({ "ok": true }),
        Err(e) => serde_json::json!({ "error": e.to_string() }),
    }
}

fn build_ui_state(engine: &SpinEngine) -> UiState {
    UiState {
        spin_number: engine.current_spin_number(),
        total_budget: engine.total_budget(),
        spent_amount: engine.spent_amount(),
        remaining_budget: engine.remaining_budget(),
        prizes: engine.prizes().to_vec(),
        history_len: engine.history().len(),
        last_outcome: engine.history().first().map(|r| r.prize.clone()),
    }
}

fn run_batch(engine: &mut SpinEngine, spins: u64) -> Result<()> {
    let mut tally: BTreeMap<String, u64> = BTreeMap::new();
    for _ in 0..spins {
        let outcome = engine.spin()?;
        *tally.entry(outcome.prize.label.clone()).or_insert(0) += 1;
    }
    print_summary(engine, &tally, spins);
    Ok(())
}

fn print_summary(engine: &SpinEngine, tally: &BTreeMap<String, u64>, spins: u64) {
    println!("=== SPIN SUMMARY ===");
    println!("  spins run:    {spins}");
    println!("  spin number:  {}", engine.current_spin_number());
    println!("  total budget: {}", engine.total_budget());
    println!("  spent:        {}", engine.spent_amount());
    println!("  remaining:    {}", engine.remaining_budget());

    println!();
    println!("=== OUTCOMES ===");
    for (label, count) in tally {
        println!("  {label:<24} x{count}");
    }

    println!();
    println!("=== REMAINING STOCK ===");
    for prize in engine.prizes() {
        println!("  {:<8} value {:>8}  qty {:>3}", prize.label, prize.value, prize.quantity);
    }

    println!();
    println!("=== RECENT HISTORY (newest first) ===");
    for record in engine.history().iter().take(10) {
        println!(
            "  #{:<4} {:<24} {:>8}  {}",
            record.spin_number, record.prize, record.amount, record.timestamp
        );
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
