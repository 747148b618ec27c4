#[macro_use]
extern crate rocket;

use discovery::{build_rocket, config};

#[launch]
async fn rocket() -> _ {
    config::load_environment();
    config::init_logger();

    let state = config::create_app_state()
        .await
        .expect("Failed to initialise application state");
    let cors = config::create_cors().expect("Failed to create CORS fairing");

    build_rocket(state).attach(cors)
}
