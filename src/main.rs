fn main() {
    if let Err(err) = bpmn_di_gen::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
