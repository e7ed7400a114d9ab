//! The `adaptest run` command.
//!
//! Drives one session against a bank on disk, either by asking the questions
//! on the terminal or by simulating an examinee with a known ability.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Table};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use adaptest_bank::{load_config_from, FileBank, Question};
use adaptest_core::bank::{ItemBank, Scope};
use adaptest_core::report::SessionReport;
use adaptest_core::service::{CatService, InitRequest, PriorOverrides};
use adaptest_core::session::Answer;
use adaptest_core::store::InMemorySessionStore;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to bank file or directory (defaults to `bank_path` from config)
    #[arg(long)]
    bank: Option<PathBuf>,

    /// Skills to test, comma-separated (default: every skill in the bank)
    #[arg(long)]
    skills: Option<String>,

    /// Only serve questions in this category
    #[arg(long)]
    category: Option<String>,

    /// Maximum number of items to ask
    #[arg(long)]
    max_items: Option<usize>,

    /// Prior mean for every skill
    #[arg(long, allow_hyphen_values = true)]
    prior_mu: Option<f64>,

    /// Prior variance for every skill
    #[arg(long)]
    prior_sigma2: Option<f64>,

    /// Answer automatically as a simulated examinee
    #[arg(long)]
    simulate: bool,

    /// Ability of the simulated examinee
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    true_theta: f64,

    /// Random seed for the simulated examinee
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Write the session report as JSON to this path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Where answers come from.
enum Responder {
    Terminal(Lines<BufReader<Stdin>>),
    Simulated { rng: StdRng, true_theta: f64 },
}

impl Responder {
    /// Get an answer to `question`, or `None` if the examinee quit.
    async fn answer(&mut self, question: &Question) -> Result<Option<bool>> {
        match self {
            Responder::Simulated { rng, true_theta } => {
                let p = question.item().probability(*true_theta);
                Ok(Some(rng.gen::<f64>() < p))
            }
            Responder::Terminal(lines) => {
                println!("\n{}", question.stem);
                for (i, option) in question.options.iter().enumerate() {
                    println!("  {}) {option}", Question::option_label(i));
                }
                loop {
                    print!("Answer (q to quit): ");
                    tokio::io::stdout().flush().await?;
                    let Some(line) = lines.next_line().await? else {
                        return Ok(None);
                    };
                    let line = line.trim();
                    if line.eq_ignore_ascii_case("q") {
                        return Ok(None);
                    }
                    match question.parse_option(line) {
                        Some(index) => return Ok(Some(question.grade(index)?)),
                        None => println!("Please enter one of the listed options."),
                    }
                }
            }
        }
    }
}

pub async fn execute(args: RunArgs) -> Result<()> {
    if let Some(sigma2) = args.prior_sigma2 {
        anyhow::ensure!(sigma2 > 0.0, "prior variance must be positive");
    }

    let config = load_config_from(args.config.as_deref())?;
    let engine_config = config.to_engine_config()?;

    let bank_path = args
        .bank
        .clone()
        .or_else(|| config.bank_path.clone())
        .context("no item bank given; pass --bank or set bank_path in adaptest.toml")?;
    let bank = Arc::new(FileBank::load(&bank_path)?);

    let shared: Arc<dyn ItemBank> = bank.clone();
    let service = CatService::new(
        shared,
        Arc::new(InMemorySessionStore::new()),
        engine_config,
    );

    let mut scope = match &args.skills {
        Some(list) => Scope::skills(list.split(',').map(str::trim)),
        None => Scope::all(),
    };
    if let Some(category) = &args.category {
        scope = scope.with_category(category.as_str());
    }

    let init = service
        .init(InitRequest {
            scope,
            prior: PriorOverrides {
                mu: args.prior_mu,
                sigma2: args.prior_sigma2,
            },
            max_items: args.max_items,
        })
        .await?;
    tracing::info!(
        session = %init.session_id,
        bank = %bank_path.display(),
        simulate = args.simulate,
        "running session"
    );

    let mut responder = if args.simulate {
        eprintln!(
            "Simulating examinee with theta = {:.2} (seed {})",
            args.true_theta, args.seed
        );
        Responder::Simulated {
            rng: StdRng::seed_from_u64(args.seed),
            true_theta: args.true_theta,
        }
    } else {
        Responder::Terminal(BufReader::new(tokio::io::stdin()).lines())
    };

    let mut next = init.first_item;
    let mut turn = 0;
    while let Some(pending) = next {
        turn += 1;
        let question = bank.question(pending.item.id)?;
        if !args.simulate {
            println!("\n[{turn}] {} (item {})", pending.skill, pending.item.id);
        }
        let Some(correct) = responder.answer(question).await? else {
            println!("Stopping early.");
            break;
        };

        let outcome = service
            .step(&init.session_id, Some(Answer::new(pending.item.id, correct)))
            .await?;
        let theta = outcome.thetas.get(&pending.skill).copied().unwrap_or_default();
        println!(
            "[{turn}] {} item {}: {}  theta = {theta:.3}",
            pending.skill,
            pending.item.id,
            if correct { "correct" } else { "incorrect" },
        );
        next = outcome.next_item;
    }

    let session = service.session(&init.session_id).await?;
    let report = SessionReport::from_session(&session);
    if !report.finished {
        tracing::info!(
            session = %report.session_id,
            asked = report.asked.len(),
            "session left unfinished"
        );
    }

    println!(
        "\nSession {} after {} item(s)",
        if report.finished { "finished" } else { "stopped" },
        report.asked.len()
    );
    println!("{}", summary_table(&report));

    if let Some(path) = &args.output {
        report.save_json(path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

/// Per-skill results as a table.
pub fn summary_table(report: &SessionReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Skill",
        "Theta",
        "SE",
        "Answered",
        "Correct",
        "Mastered",
    ]);

    for s in &report.skills {
        let correct = s.responses.iter().filter(|r| r.correct).count();
        table.add_row(vec![
            Cell::new(&s.skill),
            Cell::new(format!("{:.3}", s.theta)),
            Cell::new(
                s.standard_error
                    .map(|se| format!("{se:.3}"))
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(s.responses.len()),
            Cell::new(correct),
            Cell::new(if s.mastery_reached { "yes" } else { "no" }),
        ]);
    }

    table
}
