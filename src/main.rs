use std::env;

use dotenv::dotenv;
use env_logger::Env;
use igprofile::{build_rocket, AppConfig};
use log::{error, info};
use rocket::figment::{
    providers::{Format, Toml},
    Figment, Profile,
};
use rocket::Config;

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let mut figment = Figment::from(Config::default()).merge(Toml::file("App.toml").nested());

    if let Ok(whitelist) = env::var("INSTAGRAM_USERNAME_WHITELIST") {
        figment = figment.merge(("instagram_username_whitelist", split_list(&whitelist)));
    }

    if let Ok(cookies) = env::var("INSTAGRAM_COOKIES") {
        figment = figment.merge(("instagram_cookies", cookies));
    }

    if let Ok(proxies) = env::var("PROXIES") {
        figment = figment.merge(("proxies", split_list(&proxies)));
    }

    if let Ok(output_dir) = env::var("OUTPUT_DIR") {
        figment = figment.merge(("output_dir", output_dir));
    }

    figment = figment.select(Profile::from_env_or("APP_PROFILE", "default"));

    let config = figment.extract::<AppConfig>().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    info!("Configuration loaded successfully");
    info!("Starting igprofile API server on {}:{}", config.address, config.port);

    build_rocket(figment, config).launch().await?;
    Ok(())
}
