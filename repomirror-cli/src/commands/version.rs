use repomirror_daemon::paths::PRODUCT_NAME;

pub fn run() {
    println!("{PRODUCT_NAME} {}", repomirror_daemon::version());
}
