use log::warn;
use rocket::{Build, Rocket};

use teamfocuz_backend::config::{self, Config};

#[rocket::launch]
fn rocket() -> Rocket<Build> {
    env_logger::init();

    let config = match config::grab_config() {
        Some(result) => result,
        None => {
            warn!("Could not read or write ./config.json, using default config");
            Config::default()
        }
    };

    match teamfocuz_backend::build(config) {
        Ok(result) => result,
        Err(error) => panic!("{error:?}")
    }
}
