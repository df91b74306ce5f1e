use std::io;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use server::config::Config;
use server::handlers::root;
use server::server::{spawn_server, ServerSettings};

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let srv_tx = spawn_server(ServerSettings::from(&config));

    let bind = config.bind;
    let config = web::Data::new(config);
    log::info!("Server running on {}", bind);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&config.allowed_origin)
            .allowed_methods(vec!["GET", "POST"]);

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(srv_tx.clone()))
            .app_data(config.clone())
            .configure(root)
    })
    .bind(bind)?
    .run()
    .await
}
