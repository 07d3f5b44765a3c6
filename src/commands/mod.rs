mod analyze;
mod stop;

use crate::{Data, Error};

pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![analyze::analyze(), stop::stop()]
}
