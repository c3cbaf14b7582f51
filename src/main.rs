use clap::Parser;
use mealrs::adapters::secrets::{resolve_password, KeyringStore};
use mealrs::config::{CliConfig, Command, FileConfig};
use mealrs::core::workflow::{ReservationWorkflow, RetryPolicy};
use mealrs::core::{ConfigProvider, Credentials, MealSelector, SecretStore};
use mealrs::utils::{logger, validation::Validate};
use mealrs::{MealError, Session};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting mealrs");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證命令列參數
    if let Err(e) = cli.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ {} (category: {:?}, severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = e.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: CliConfig) -> mealrs::Result<()> {
    // 配置檔不存在時先產生範本，提示使用者填入帳號後再執行
    if FileConfig::ensure_exists(&cli.config)? {
        println!("{} has been created in your current directory.", cli.config);
        println!("Please update the email_address field with your MealPal account.");
        return Err(MealError::MissingConfigError {
            field: "email_address".to_string(),
        });
    }

    let config = FileConfig::from_file(&cli.config)?;
    config.validate()?;

    let store = KeyringStore::new(keyring_service(&cli.base_url));

    match cli.command {
        Command::SavePass => {
            let password = prompt_password()?;
            store.set_secret(config.email_address(), &password)?;
            println!("✅ Password saved to the OS keychain.");
            Ok(())
        }

        Command::Status => {
            let session = authenticated_session(&cli.base_url, &config, &store).await?;
            let snapshot = session.current_meal().await?;

            match snapshot.reservation() {
                Some(held) => {
                    println!("✅ Current reservation:");
                    if let Some(meal) = &held.meal {
                        println!("   {}", meal.name);
                    }
                    if let Some(restaurant) = &held.restaurant {
                        println!("   from {}", restaurant.name);
                    }
                    if let Some(pickup) = &held.pickup_time {
                        println!("   pickup {}", pickup);
                    }
                    if let Some(order) = &held.order_number {
                        println!("   order #{}", order);
                    }
                }
                None => println!("No reservation held right now."),
            }
            Ok(())
        }

        Command::Reserve {
            restaurant,
            pickup_time,
            city,
            meal,
            cancel_first,
            max_attempts,
            deadline_secs,
        } => {
            let credentials = gather_credentials(&config, &store)?;
            let session = Session::new(&cli.base_url, credentials)?;

            let selector = MealSelector::from_names(meal, Some(restaurant)).ok_or_else(|| {
                MealError::MissingConfigError {
                    field: "restaurant".to_string(),
                }
            })?;

            let mut policy = RetryPolicy::default();
            policy.max_attempts = max_attempts;
            policy.deadline = deadline_secs.map(Duration::from_secs);

            tracing::info!("🍜 Reserving {} in {} at {}", selector, city, pickup_time);
            let workflow = ReservationWorkflow::new(session).with_policy(policy);

            // Ctrl-C 不直接砍掉行程，改為在下一輪重試前收手
            let cancel = workflow.cancel_flag();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received, stopping after the current attempt");
                    cancel.cancel();
                }
            });

            let outcome = workflow
                .execute(&selector, &pickup_time, &city, cancel_first)
                .await?;

            println!("✅ Reservation success!");
            println!(
                "   {} from {} at {}",
                outcome.meal, outcome.restaurant, outcome.pickup_time
            );
            println!(
                "   logins: {}, submissions: {}",
                outcome.login_attempts, outcome.reserve_attempts
            );
            Ok(())
        }
    }
}

/// Single-shot login for the read-only commands; the reservation workflow
/// has its own retry loop.
async fn authenticated_session<C, S>(
    base_url: &str,
    config: &C,
    store: &S,
) -> mealrs::Result<Session>
where
    C: ConfigProvider,
    S: SecretStore,
{
    let credentials = gather_credentials(config, store)?;
    let session = Session::new(base_url, credentials)?;

    let status = session.login().await?;
    if status != StatusCode::OK {
        return Err(MealError::LoginFailed { status });
    }
    tracing::info!("✅ Logged in");
    Ok(session)
}

fn gather_credentials<C, S>(config: &C, store: &S) -> mealrs::Result<Credentials>
where
    C: ConfigProvider,
    S: SecretStore,
{
    let email = config.email_address().to_string();
    let password = resolve_password(store, &email, config.use_secret_store(), prompt_password)?;

    Ok(Credentials {
        username: email,
        password,
    })
}

fn prompt_password() -> mealrs::Result<String> {
    Ok(rpassword::prompt_password("Enter password: ")?)
}

fn keyring_service(base_url: &str) -> String {
    Url::parse(base_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "secure.mealpal.com".to_string())
}
