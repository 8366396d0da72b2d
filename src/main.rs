use std::process;

#[tokio::main]
async fn main() {
    // process::exit rather than returning ExitCode: the repl may leave a
    // blocking stdin read behind after Ctrl-C, and runtime shutdown would
    // wait on it.
    match gemcli::run().await {
        Ok(()) => process::exit(0),
        Err(err) => {
            eprintln!("{err:#}");
            process::exit(1);
        }
    }
}
