use clap::Parser;
use log::{
    error,
    info,
    warn,
};
use rhymuwire::{
    Limits,
    Request,
};
use std::{
    net::TcpListener,
    process,
};

#[derive(Parser)]
#[command(name = "tcplistener")]
#[command(about = "Print every HTTP/1.1 request received", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 42069)]
    port: u16,
}

fn print_request(request: &Request) {
    println!("Request line:");
    println!("- Method: {}", request.request_line.method);
    println!("- Target: {}", request.request_line.target);
    println!("- Version: {}", request.request_line.version);
    println!("Headers:");
    for (name, value) in request.headers.iter() {
        println!("- {}: {}", name, value);
    }
    println!("Body:");
    println!("{}", String::from_utf8_lossy(&request.body));
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();
    let args = Args::parse();
    let listener = match TcpListener::bind((args.host.as_str(), args.port)) {
        Ok(listener) => listener,
        Err(error) => {
            error!("unable to create listener: {}", error);
            process::exit(1);
        },
    };
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(error) => {
                warn!("unable to accept connection: {}", error);
                continue;
            },
        };
        info!("connection has been accepted");
        match Request::from_reader_with_limits(&stream, Limits::default()) {
            Ok(request) => print_request(&request),
            Err(error) => warn!("unable to parse request: {}", error),
        }
        info!("connection has been closed");
    }
}
