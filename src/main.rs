use std::{
    env, fs,
    io::{self, Read},
    process,
};

use jsonpath_model::{find, to_path_string, tracer::Matched};
use log::debug;
use serde_json::Value;

fn main() {
    env_logger::init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    let Some(path) = args.first() else {
        eprintln!("usage: jsonpath-model <path> [file]");
        process::exit(2);
    };

    if let Err(err) = run(path, args.get(1).map(String::as_str)) {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn run(path: &str, file: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let text = match file {
        Some(file) => fs::read_to_string(file)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let document: Value = serde_json::from_str(&text)?;
    let matches = find(path, &document)?;
    debug!("{} matches for {path}", matches.len());

    for m in matches {
        let value = match &m.value {
            Matched::Value(node) => serde_json::to_string(node)?,
            Matched::Property(key) => serde_json::to_string(key)?,
        };
        println!("{} {value}", to_path_string(&m.path));
    }

    Ok(())
}
