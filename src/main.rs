use clap::Parser;
use swipe_predict::config::{Command, UserArgs};
use swipe_predict::utils::error::ErrorSeverity;
use swipe_predict::utils::{logger, validation::Validate};
use swipe_predict::{session_from_config, AppConfig, CliArgs, SwipeError, SwipeOutcome, SwipeSession};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let config = match AppConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => fail(e),
    };

    if args.json_logs || config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::debug!("CLI args: {:?}", args);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(e);
    }

    let result = match &args.command {
        Command::Feed(user) => run_feed(&config, user).await,
        Command::Play(user) => run_play(&config, user).await,
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        fail(e);
    }

    Ok(())
}

fn fail(e: SwipeError) -> ! {
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

async fn start_session(config: &AppConfig, user: &UserArgs) -> swipe_predict::Result<SwipeSession> {
    let mut session = session_from_config(config)?;
    if let Some(identity) = user.identity() {
        session.sign_in(identity).await;
    }
    let count = session.refresh().await?;
    tracing::info!("Loaded {} cards", count);
    Ok(session)
}

async fn run_feed(config: &AppConfig, user: &UserArgs) -> swipe_predict::Result<()> {
    let session = start_session(config, user).await?;

    for (i, card) in session.visible_cards().iter().enumerate() {
        println!(
            "{:>2}. [{}] {} ({}) id={}",
            i + 1,
            card.category,
            card.question,
            card.odds,
            card.id
        );
    }
    if session.is_caught_up() {
        println!("Caught up! Nothing to swipe right now.");
    }

    session.shutdown().await;
    Ok(())
}

async fn run_play(config: &AppConfig, user: &UserArgs) -> swipe_predict::Result<()> {
    let mut session = start_session(config, user).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(card) = session.top_card() {
        println!("▶ {} ({})", card.question, card.odds);

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let offset: f64 = match line.trim().parse() {
            Ok(offset) => offset,
            Err(_) => {
                eprintln!("Expected a horizontal offset such as 150 or -120, got '{}'", line.trim());
                continue;
            }
        };

        if let Some(fb) = session.drag(&card.id, offset) {
            tracing::debug!(
                "yes={:.2} no={:.2} rotation={:.1}°",
                fb.yes_intensity,
                fb.no_intensity,
                fb.rotation
            );
        }

        match session.release(&card.id, offset) {
            SwipeOutcome::Committed { event, queued } => {
                let note = if queued { "" } else { " (not recorded)" };
                println!("✔ {} on {}{}", event.decision, card.id, note);
            }
            SwipeOutcome::SprungBack => println!("↺ not far enough, card springs back"),
            SwipeOutcome::LoginRequired { .. } => {
                println!("🔒 Please login to place a bet (pass --user)");
            }
            SwipeOutcome::Ignored => {}
        }
    }

    if session.top_card().is_none() {
        println!("Caught up! 🎉");
    }

    let stats = session.shutdown().await;
    println!(
        "Decisions: {} submitted, {} recorded, {} failed",
        stats.submitted, stats.recorded, stats.failed
    );
    Ok(())
}
