use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use clap::Arg;
use std::io::{self, Write};
use std::path::Path;
use tagblog::app::{self, AppState};
use tagblog::config::Config;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let matches = clap::App::new("tagblog")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Serves a small tag-aware blog")
        .arg(
            Arg::with_name("project")
                .long("project")
                .value_name("DIR")
                .help("The directory containing blog.yaml (default: search upward from the current directory)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("listen")
                .long("listen")
                .value_name("ADDR")
                .help("The address to bind, overriding the project's `listen`")
                .takes_value(true),
        )
        .get_matches();

    let mut config = load_config(matches.value_of("project"))?;
    if let Some(listen) = matches.value_of("listen") {
        config.listen = listen.to_owned();
    }

    let listen = config.listen.clone();
    let state = web::Data::new(AppState::open(config).map_err(other)?);
    log::info!("Listening on {}", listen);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(app::routes)
    })
    .bind(listen)?
    .run()
    .await
}

fn load_config(project: Option<&str>) -> io::Result<Config> {
    let result = match project {
        Some(dir) => Config::from_directory(Path::new(dir)),
        None => Config::from_directory(&std::env::current_dir()?),
    };
    match result {
        Ok(config) => Ok(config),
        Err(tagblog::config::Error::NotFound) if project.is_none() => {
            log::warn!("No blog.yaml found; using the default configuration");
            Ok(Config::default())
        }
        Err(err) => Err(other(err)),
    }
}

fn other<E: std::error::Error + Send + Sync + 'static>(err: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}
