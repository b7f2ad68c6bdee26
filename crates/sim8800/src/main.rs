use sim8800::Options;

fn main() {
    env_logger::init();

    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = sim8800::run(options) {
        log::error!("{:#}", err);
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}
