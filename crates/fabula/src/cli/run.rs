//! Command handlers.

use super::commands::{Cli, Commands, OutputFormat};
use fabula::{
    FabulaResult, Feature, JsonFileRepository, QuotaConfig, Tier, UsageGate, UsageReport, UserId,
    gate_from_config,
};
use tracing::{debug, info, warn};

/// Result of a command that ran without errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command did what was asked
    Done,
    /// The gate refused the request
    Denied,
}

impl CommandOutcome {
    /// Whether the process should exit successfully.
    pub fn success(&self) -> bool {
        matches!(self, CommandOutcome::Done)
    }
}

/// Load configuration and counters, run one command, then save counters.
pub async fn run_command(cli: &Cli) -> FabulaResult<CommandOutcome> {
    let config = match &cli.config {
        Some(path) => QuotaConfig::from_file(path)?,
        None => QuotaConfig::load()?,
    };
    let gate = gate_from_config(&config)?;

    let state_path = cli.state.clone().or(config.persistence.path.clone());
    let repository = state_path.map(JsonFileRepository::new);

    match &repository {
        Some(repository) => {
            let restored = gate.restore_from(repository).await?;
            debug!(restored, path = %repository.path().display(), "Loaded usage counters");
        }
        None => {
            debug!("No counter file configured; usage is not kept between runs");
        }
    }

    let outcome = execute(&gate, &cli.command)?;

    if let Some(repository) = &repository
        && mutates(&cli.command)
    {
        gate.persist_to(repository).await?;
    }

    Ok(outcome)
}

fn mutates(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Track { .. }
            | Commands::Acquire { .. }
            | Commands::Refund { .. }
            | Commands::Reset { .. }
    )
}

fn execute(gate: &UsageGate, command: &Commands) -> FabulaResult<CommandOutcome> {
    match command {
        Commands::Check {
            user,
            feature,
            tier,
        } => {
            let feature = Feature::parse_key(feature)?;
            let tier = Tier::from_name_or_default(tier);
            if gate.check_limit(&UserId::new(user), feature, tier) {
                println!("allowed");
                Ok(CommandOutcome::Done)
            } else {
                println!("denied");
                Ok(CommandOutcome::Denied)
            }
        }

        Commands::Track { user, feature } => {
            let feature = Feature::parse_key(feature)?;
            let user = UserId::new(user);
            gate.track_usage(&user, feature);
            println!("{}", gate.store().current_count(&user, feature));
            Ok(CommandOutcome::Done)
        }

        Commands::Acquire {
            user,
            feature,
            tier,
        } => {
            let feature = Feature::parse_key(feature)?;
            let tier = Tier::from_name_or_default(tier);
            match gate.try_acquire(&UserId::new(user), feature, tier) {
                Ok(count) => {
                    println!("{}", count);
                    Ok(CommandOutcome::Done)
                }
                Err(e) if e.kind().is_denial() => {
                    println!("denied: {}", e.kind());
                    Ok(CommandOutcome::Denied)
                }
                Err(e) => Err(e.into()),
            }
        }

        Commands::Refund { user, feature } => {
            let feature = Feature::parse_key(feature)?;
            println!("{}", gate.refund(&UserId::new(user), feature));
            Ok(CommandOutcome::Done)
        }

        Commands::Status { user, tier, format } => {
            let tier = Tier::from_name_or_default(tier);
            let report = gate.usage_report(&UserId::new(user), tier);
            print_report(&report, *format)?;
            Ok(CommandOutcome::Done)
        }

        Commands::Reset { user, feature } => {
            let feature = feature.as_deref().map(Feature::parse_key).transpose()?;
            gate.reset(&UserId::new(user), feature);
            match feature {
                Some(feature) => info!(%user, %feature, "Counter reset"),
                None => warn!(%user, "All counters for user cleared"),
            }
            Ok(CommandOutcome::Done)
        }

        Commands::Tiers => {
            print_tiers(gate);
            Ok(CommandOutcome::Done)
        }
    }
}

fn print_report(report: &UsageReport, format: OutputFormat) -> FabulaResult<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).map_err(|e| {
                fabula::StorageError::new(fabula::StorageErrorKind::Encoding(e.to_string()))
            })?;
            println!("{}", json);
        }
        OutputFormat::Human => {
            println!(
                "Usage for '{}' on tier {} in {}:",
                report.user, report.tier, report.window
            );
            println!("{:-<60}", "");
            println!("{:<24}{:>10}{:>13}{:>13}", "feature", "used", "allowance", "remaining");
            for usage in &report.features {
                let remaining = usage
                    .remaining
                    .map_or_else(|| "-".to_string(), |r| r.to_string());
                println!(
                    "{:<24}{:>10}{:>13}{:>13}",
                    usage.feature,
                    usage.used,
                    usage.allowance.to_string(),
                    remaining
                );
            }
        }
    }
    Ok(())
}

fn print_tiers(gate: &UsageGate) {
    use strum::IntoEnumIterator;

    print!("{:<24}", "feature");
    for tier in Tier::iter() {
        print!("{:>14}", tier.to_string());
    }
    println!();

    for feature in Feature::iter() {
        print!("{:<24}", feature.to_string());
        for tier in Tier::iter() {
            print!("{:>14}", gate.policy().allowance_for(tier, feature).to_string());
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use fabula::{FabulaErrorKind, QuotaErrorKind, UsageRepository};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const CONFIG: &str = "[tiers.free]\nstory_generation = 3\n";

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fabula.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    fn parse(config: &Path, state: Option<&Path>, args: &[&str]) -> Cli {
        let mut argv = vec![
            "fabula".to_string(),
            "--config".to_string(),
            config.display().to_string(),
        ];
        if let Some(state) = state {
            argv.push("--state".to_string());
            argv.push(state.display().to_string());
        }
        argv.extend(args.iter().map(|arg| arg.to_string()));
        Cli::try_parse_from(argv).unwrap()
    }

    async fn persisted_count(path: &Path, user: &str, feature: Feature) -> u64 {
        let snapshot = JsonFileRepository::new(path).load().await.unwrap().unwrap();
        snapshot
            .counters
            .iter()
            .find(|r| r.user.as_str() == user && r.feature == feature)
            .map_or(0, |r| r.count)
    }

    #[tokio::test]
    async fn test_acquire_past_cap_is_denied() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_config(temp_dir.path(), CONFIG);
        let state = temp_dir.path().join("usage.json");
        let acquire = [
            "acquire",
            "--user",
            "ana",
            "--feature",
            "story_generation",
            "--tier",
            "free",
        ];

        for _ in 0..3 {
            let cli = parse(&config, Some(&state), &acquire);
            assert_eq!(run_command(&cli).await.unwrap(), CommandOutcome::Done);
        }

        let cli = parse(&config, Some(&state), &acquire);
        let outcome = run_command(&cli).await.unwrap();
        assert_eq!(outcome, CommandOutcome::Denied);
        assert!(!outcome.success());
        assert_eq!(persisted_count(&state, "ana", Feature::StoryGeneration).await, 3);
    }

    #[tokio::test]
    async fn test_check_reports_denial_without_recording() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_config(temp_dir.path(), CONFIG);
        let state = temp_dir.path().join("usage.json");

        let cli = parse(
            &config,
            Some(&state),
            &["check", "--user", "ana", "--feature", "cover_generation", "--tier", "free"],
        );
        assert_eq!(run_command(&cli).await.unwrap(), CommandOutcome::Denied);

        let cli = parse(
            &config,
            Some(&state),
            &["check", "--user", "ana", "--feature", "chat", "--tier", "gold"],
        );
        assert_eq!(run_command(&cli).await.unwrap(), CommandOutcome::Done);
        assert!(!state.exists());
    }

    #[tokio::test]
    async fn test_only_mutating_commands_save_state() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_config(temp_dir.path(), CONFIG);
        let state = temp_dir.path().join("usage.json");

        for args in [
            &["status", "--user", "ana", "--tier", "free"][..],
            &["status", "--user", "ana", "--tier", "free", "--format", "json"][..],
            &["tiers"][..],
        ] {
            let cli = parse(&config, Some(&state), args);
            assert_eq!(run_command(&cli).await.unwrap(), CommandOutcome::Done);
            assert!(!state.exists());
        }

        let cli = parse(
            &config,
            Some(&state),
            &["track", "--user", "ana", "--feature", "chat"],
        );
        run_command(&cli).await.unwrap();
        assert_eq!(persisted_count(&state, "ana", Feature::Chat).await, 1);
    }

    #[tokio::test]
    async fn test_state_path_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let state = temp_dir.path().join("nested").join("usage.json");
        let body = format!(
            "{}\n[persistence]\npath = {:?}\n",
            CONFIG,
            state.display().to_string()
        );
        let config = write_config(temp_dir.path(), &body);

        for _ in 0..2 {
            let cli = parse(&config, None, &["track", "--user", "bia", "--feature", "export"]);
            run_command(&cli).await.unwrap();
        }

        assert_eq!(persisted_count(&state, "bia", Feature::Export).await, 2);
    }

    #[tokio::test]
    async fn test_unknown_feature_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_config(temp_dir.path(), CONFIG);
        let state = temp_dir.path().join("usage.json");

        let cli = parse(
            &config,
            Some(&state),
            &["acquire", "--user", "ana", "--feature", "poetry", "--tier", "free"],
        );
        let err = run_command(&cli).await.unwrap_err();
        match err.kind() {
            FabulaErrorKind::Quota(e) => {
                assert_eq!(e.kind(), &QuotaErrorKind::UnknownFeature("poetry".to_string()))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!state.exists());
    }

    #[tokio::test]
    async fn test_reset_restores_allowance() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_config(temp_dir.path(), CONFIG);
        let state = temp_dir.path().join("usage.json");
        let acquire = [
            "acquire",
            "--user",
            "ana",
            "--feature",
            "story_generation",
            "--tier",
            "free",
        ];

        for _ in 0..3 {
            run_command(&parse(&config, Some(&state), &acquire)).await.unwrap();
        }
        assert_eq!(
            run_command(&parse(&config, Some(&state), &acquire)).await.unwrap(),
            CommandOutcome::Denied
        );

        let cli = parse(
            &config,
            Some(&state),
            &["reset", "--user", "ana", "--feature", "story_generation"],
        );
        run_command(&cli).await.unwrap();
        assert_eq!(persisted_count(&state, "ana", Feature::StoryGeneration).await, 0);

        assert_eq!(
            run_command(&parse(&config, Some(&state), &acquire)).await.unwrap(),
            CommandOutcome::Done
        );
    }
}
