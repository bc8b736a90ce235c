//! wr: CLI for the wormhole rolling planner.
//!
//! Subcommands:
//! - plan       one-shot recommendation for a belief + mass used
//! - session    interactive driver: record jumps, replan after each
//! - catalog    print the round-trip jump catalog

use std::env;
use std::io::{self, BufRead, Write};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use wr_core::belief::Belief;
use wr_core::config::Config;
use wr_core::observe::{update_total_belief, Observation};
use wr_logging::{JumpEventV1, PlanEventV1, SessionLog};
use wr_mcts::{Planner, Tree};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

struct CommonArgs {
    min: Option<f64>,
    max: Option<f64>,
    used: f64,
    iterations: u32,
    seed: u64,
    config: Option<String>,
    top: Option<usize>,
    log: Option<String>,
}

impl CommonArgs {
    fn parse(args: &[String], usage: &str) -> CommonArgs {
        let mut out = CommonArgs {
            min: None,
            max: None,
            used: 0.0,
            iterations: 100_000,
            seed: 0,
            config: None,
            top: None,
            log: None,
        };

        let mut i = 0usize;
        while i < args.len() {
            match args[i].as_str() {
                "--help" | "-h" => {
                    println!("{usage}");
                    process::exit(0);
                }
                "--min" => out.min = Some(take_value(args, i, "--min")),
                "--max" => out.max = Some(take_value(args, i, "--max")),
                "--used" => out.used = take_value(args, i, "--used"),
                "--iterations" => out.iterations = take_value(args, i, "--iterations"),
                "--seed" => out.seed = take_value(args, i, "--seed"),
                "--config" => out.config = Some(take_value(args, i, "--config")),
                "--top" => out.top = Some(take_value(args, i, "--top")),
                "--log" => out.log = Some(take_value(args, i, "--log")),
                other => {
                    eprintln!("Unknown option: {other}");
                    eprintln!("{usage}");
                    process::exit(1);
                }
            }
            // Every surviving branch is a value-taking flag.
            i += 2;
        }
        out
    }

    fn belief(&self) -> Belief {
        let (Some(min), Some(max)) = (self.min, self.max) else {
            eprintln!("Both --min and --max are required");
            process::exit(1);
        };
        Belief::new(min, max).unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(1);
        })
    }

    fn load_config(&self) -> Config {
        match &self.config {
            Some(path) => Config::load(path).unwrap_or_else(|e| {
                eprintln!("Failed to load {path}: {e}");
                process::exit(1);
            }),
            None => Config::default(),
        }
    }
}

fn take_value<T: std::str::FromStr>(args: &[String], i: usize, name: &str) -> T {
    let Some(raw) = args.get(i + 1) else {
        eprintln!("Missing value for {name}");
        process::exit(1);
    };
    raw.parse().unwrap_or_else(|_| {
        eprintln!("Invalid {name} value: {raw}");
        process::exit(1);
    })
}

fn build_planner(config: &Config) -> Planner {
    Planner::new(config.catalog.clone(), config.planner).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    })
}

fn print_summary(planner: &Planner, tree: &Tree, top: Option<usize>) {
    let results = planner.action_results(tree);
    if results.is_empty() {
        println!("No applicable actions from this belief.");
        return;
    }

    println!(
        "{:<14} {:>8} {:>9} {:>9} {:>7} {:>6}",
        "ACTION", "VISITS", "SUCCESS", "SCORE", "STEPS", "SAFE"
    );
    for r in results.iter().take(top.unwrap_or(results.len())) {
        println!(
            "{:<14} {:>8} {:>8.1}% {:>9.3} {:>7.1} {:>6}",
            r.key,
            r.visits,
            r.success_rate * 100.0,
            r.strategy_score,
            r.avg_steps,
            if r.guaranteed_safe { "yes" } else { "NO" }
        );
    }

    let dist = planner.trip_distribution(tree);
    if !dist.is_empty() {
        println!();
        println!("Trip distribution:");
        for b in &dist {
            println!("  {:>2} trips {:>5.1}%", b.trips, b.pct * 100.0);
        }
    }

    let seq = planner.sequence(tree);
    if !seq.is_empty() {
        println!();
        println!("Most-visited line: {}", seq.join(" -> "));
    }
}

fn cmd_plan(args: &[String]) {
    let usage = r#"wr plan

USAGE:
    wr plan --min MIN --max MAX [OPTIONS]

OPTIONS:
    --min M           Lower bound on total hole mass (millions)
    --max M           Upper bound on total hole mass (millions)
    --used M          Mass already through the hole (default: 0)
    --iterations N    Search iterations (default: 100000)
    --seed S          RNG seed (default: 0)
    --config PATH     YAML config (default: built-in)
    --top N           Show only the top N actions
"#;
    let common = CommonArgs::parse(args, usage);
    let belief = common.belief();
    let config = common.load_config();
    let planner = build_planner(&config);

    let mut rng = ChaCha8Rng::seed_from_u64(common.seed);
    let tree = planner
        .plan(belief, common.used, common.iterations, &mut rng)
        .unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(1);
        });

    println!(
        "Total mass [{}, {}], used {}, {} iterations, {} nodes",
        belief.min,
        belief.max,
        common.used,
        common.iterations,
        tree.len()
    );
    println!();
    print_summary(&planner, &tree, common.top);
}

fn cmd_session(args: &[String]) {
    let usage = r#"wr session

USAGE:
    wr session --min MIN --max MAX [OPTIONS]

OPTIONS:
    --min M           Lower bound on total hole mass (millions)
    --max M           Upper bound on total hole mass (millions)
    --used M          Mass already through the hole (default: 0)
    --iterations N    Search iterations per plan (default: 100000)
    --seed S          RNG seed (default: 0)
    --config PATH     YAML config (default: built-in)
    --log PATH        Append NDJSON session history to PATH

COMMANDS (stdin):
    plan [N]          Recommend the next jump (N iterations)
    jump KEY OBS      Record a round trip and the observed state
                      (OBS: fresh | shrink | crit | collapsed)
    status            Show current belief and mass used
    help              This text
    quit              Exit
"#;
    let common = CommonArgs::parse(args, usage);
    let mut belief = common.belief();
    let mut mass_used = common.used;
    let config = common.load_config();
    let planner = build_planner(&config);
    let mut rng = ChaCha8Rng::seed_from_u64(common.seed);

    let session_id = format!("{:x}", now_ms());
    let mut log = common.log.as_ref().map(|path| {
        SessionLog::open_append(path).unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(1);
        })
    });

    println!("Session {session_id}. Type 'help' for commands.");
    let stdin = io::stdin();
    loop {
        print!("wr> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("stdin: {e}");
                break;
            }
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [] => {}
            ["quit"] | ["exit"] => break,
            ["help"] => println!("{usage}"),
            ["status"] => {
                println!(
                    "total belief [{}, {}], used {}, remaining [{}, {}]",
                    belief.min,
                    belief.max,
                    mass_used,
                    belief.remaining(mass_used).min,
                    belief.remaining(mass_used).max
                );
            }
            ["plan", rest @ ..] => {
                let iterations = match rest {
                    [] => common.iterations,
                    [n] => match n.parse() {
                        Ok(n) => n,
                        Err(_) => {
                            eprintln!("Invalid iteration count: {n}");
                            continue;
                        }
                    },
                    _ => {
                        eprintln!("Usage: plan [N]");
                        continue;
                    }
                };
                match planner.plan(belief, mass_used, iterations, &mut rng) {
                    Ok(tree) => {
                        print_summary(&planner, &tree, common.top);
                        if let Some(log) = log.as_mut() {
                            let best = planner.best_action(&tree);
                            let ev = PlanEventV1 {
                                event: PlanEventV1::EVENT,
                                ts_ms: now_ms(),
                                session_id: session_id.clone(),
                                belief_min: belief.min,
                                belief_max: belief.max,
                                mass_used,
                                iterations,
                                tree_nodes: tree.len(),
                                best_key: best.as_ref().map(|b| b.key.clone()),
                                best_success_rate: best.as_ref().map(|b| b.success_rate),
                            };
                            log_event(log, &ev);
                        }
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            ["jump", key, obs] => {
                let Some(aid) = config.catalog.find(key) else {
                    eprintln!("Unknown action key: {key} (see 'wr catalog')");
                    continue;
                };
                let Some(obs) = Observation::parse(obs) else {
                    eprintln!("Unknown observation: {obs}");
                    continue;
                };
                let entry = config.catalog.get(aid);
                let new_used = mass_used + entry.action.round_trip();
                match update_total_belief(belief, new_used, obs, &planner.config().observe) {
                    Ok(updated) => {
                        mass_used = new_used;
                        belief = updated;
                        println!(
                            "Recorded {} ({obs}); used {}, total belief [{}, {}]",
                            entry.key, mass_used, belief.min, belief.max
                        );
                        if let Some(log) = log.as_mut() {
                            let ev = JumpEventV1 {
                                event: JumpEventV1::EVENT,
                                ts_ms: now_ms(),
                                session_id: session_id.clone(),
                                action_key: entry.key.clone(),
                                observation: obs,
                                mass_used,
                                belief_min: belief.min,
                                belief_max: belief.max,
                            };
                            log_event(log, &ev);
                        }
                    }
                    Err(e) => eprintln!("Not recorded: {e}"),
                }
            }
            _ => eprintln!("Unknown command. Type 'help'."),
        }
    }

    if let Some(log) = log.as_mut() {
        if let Err(e) = log.flush() {
            eprintln!("{e}");
        }
    }
}

fn log_event<T: serde::Serialize>(log: &mut SessionLog, ev: &T) {
    if let Err(e) = log.write_event(ev) {
        eprintln!("{e}");
    }
    if let Err(e) = log.flush() {
        eprintln!("{e}");
    }
}

fn cmd_catalog(args: &[String]) {
    let usage = r#"wr catalog

USAGE:
    wr catalog [--config PATH]
"#;
    let common = CommonArgs::parse(args, usage);
    let config = common.load_config();

    println!(
        "{:<14} {:>6} {:>6} {:>6}  {}",
        "KEY", "OUT", "BACK", "TRIP", "LABEL"
    );
    for (_, e) in config.catalog.iter() {
        println!(
            "{:<14} {:>6} {:>6} {:>6}  {}",
            e.key,
            e.action.out,
            e.action.back,
            e.action.round_trip(),
            e.label
        );
    }
}

fn print_help() {
    eprintln!(
        r#"wr - wormhole rolling planner

USAGE:
    wr <COMMAND> [OPTIONS]

COMMANDS:
    plan        One-shot recommendation for a mass belief
    session     Interactive session: record jumps, replan after each
    catalog     Print the round-trip jump catalog

Run 'wr <COMMAND> --help' for command options.
"#
    );
}

fn main() {
    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("plan") => cmd_plan(&args[2..]),
        Some("session") => cmd_session(&args[2..]),
        Some("catalog") => cmd_catalog(&args[2..]),
        Some("--version" | "-V") => println!("wr {}", wr_mcts::VERSION),
        Some("--help" | "-h") | None => print_help(),
        Some(other) => {
            eprintln!("Unknown command: {other}");
            print_help();
            process::exit(1);
        }
    }
}
