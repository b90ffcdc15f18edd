//! Accepts TCP connections and prints each parsed request.
//!
//! A debugging aid: point `curl` at it to see exactly what the parser makes
//! of a request. Nothing is ever written back.

use clap::Parser;
use tokio::net::TcpListener;

use httpfromtcp::http::Request;

#[derive(Parser, Debug)]
#[command(name = "tcplistener", about = "Print parsed HTTP requests received over TCP")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = 42069)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let listener = TcpListener::bind(("0.0.0.0", cli.port)).await?;
    println!("listening on {}", listener.local_addr()?);

    loop {
        let (mut stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                eprintln!("accept failed: {}", e);
                continue;
            }
        };
        println!("connection accepted from {}", peer);

        match Request::from_reader(&mut stream).await {
            Ok(request) => print!("{}", request),
            Err(e) => eprintln!("error: {}", e),
        }
        println!("connection to {} closed", peer);
    }
}
