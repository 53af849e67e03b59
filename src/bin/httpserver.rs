use clap::Parser;
use log::{
    error,
    info,
};
use rhymuwire::{
    default_headers,
    Error,
    Headers,
    Limits,
    Request,
    Server,
    StatusCode,
    Writer,
};
use sha2::{
    Digest,
    Sha256,
};
use signal_hook::{
    consts::TERM_SIGNALS,
    iterator::Signals,
};
use std::{
    net::TcpStream,
    process,
};

// Larger counts are refused so that one request cannot keep a connection
// thread busy for long.
const MAX_STREAM_CHUNKS: usize = 1000;

#[derive(Parser)]
#[command(name = "httpserver")]
#[command(about = "Serve a handful of demonstration pages over HTTP/1.1", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 42069)]
    port: u16,

    /// Largest request accepted, in bytes, including its body
    #[arg(long, default_value_t = 10_000_000)]
    max_message_size: usize,

    /// Longest request line or header line accepted, in bytes
    #[arg(long, default_value_t = 8192)]
    line_limit: usize,
}

fn html(
    title: &str,
    heading: &str,
    message: &str,
) -> String {
    format!(
        concat!(
            "<html>\n",
            "  <head>\n",
            "    <title>{}</title>\n",
            "  </head>\n",
            "  <body>\n",
            "    <h1>{}</h1>\n",
            "    <p>{}</p>\n",
            "  </body>\n",
            "</html>",
        ),
        title, heading, message
    )
}

fn respond_with_page(
    writer: &mut Writer<&TcpStream>,
    status: StatusCode,
    heading: &str,
    message: &str,
) -> Result<(), Error> {
    let title = format!("{} {}", status.code(), status.reason_phrase());
    let body = html(&title, heading, message);
    let mut headers = default_headers(body.len());
    headers.replace("Content-Type", "text/html");
    writer.write_status_line(status)?;
    writer.write_headers(&headers)?;
    writer.write_body(body)?;
    Ok(())
}

fn respond_with_stream(
    writer: &mut Writer<&TcpStream>,
    count: usize,
) -> Result<(), Error> {
    let mut headers = default_headers(0);
    headers.remove("Content-Length");
    headers.replace("Content-Type", "application/json");
    headers.set("Transfer-Encoding", "chunked");
    headers.set("Trailer", "X-Content-SHA256, X-Content-Length");
    writer.write_status_line(StatusCode::Ok)?;
    writer.write_headers(&headers)?;

    let mut hasher = Sha256::new();
    let mut length = 0;
    for id in 0..count {
        let chunk = format!("{{\"id\": {}, \"of\": {}}}\n", id, count);
        hasher.update(chunk.as_bytes());
        length += chunk.len();
        writer.write_chunked_body(chunk)?;
    }
    writer.write_chunked_body_done()?;

    let digest = hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect::<String>();
    let mut trailers = Headers::new();
    trailers.set("X-Content-SHA256", digest);
    trailers.set("X-Content-Length", length.to_string());
    writer.write_trailers(&trailers)
}

fn route(
    writer: &mut Writer<&TcpStream>,
    request: &Request,
) -> Result<(), Error> {
    let target = request.request_line.target.as_str();
    if let Some(count) = target.strip_prefix("/stream/") {
        return match count.parse::<usize>() {
            Ok(count) if count <= MAX_STREAM_CHUNKS => {
                respond_with_stream(writer, count)
            },
            _ => respond_with_page(
                writer,
                StatusCode::BadRequest,
                "Bad Request",
                "Ask for a stream of at most 1000 chunks.",
            ),
        };
    }
    match target {
        "/yourproblem" => respond_with_page(
            writer,
            StatusCode::BadRequest,
            "Bad Request",
            "Your request honestly kinda sucked.",
        ),
        "/myproblem" => respond_with_page(
            writer,
            StatusCode::InternalServerError,
            "Internal Server Error",
            "Okay, you know what? This one is on me.",
        ),
        _ => respond_with_page(
            writer,
            StatusCode::Ok,
            "Success!",
            "Your request was an absolute banger.",
        ),
    }
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();
    let args = Args::parse();
    let limits = Limits {
        max_message_size: Some(args.max_message_size),
        line_limit: Some(args.line_limit),
    };

    let mut signals = match Signals::new(TERM_SIGNALS) {
        Ok(signals) => signals,
        Err(error) => {
            error!("unable to register signal handlers: {}", error);
            process::exit(1);
        },
    };
    let server =
        match Server::serve((args.host.as_str(), args.port), limits, route) {
            Ok(server) => server,
            Err(error) => {
                error!("unable to start server: {}", error);
                process::exit(1);
            },
        };
    info!("server started on port {}", server.local_addr().port());

    if let Some(signal) = signals.forever().next() {
        info!("received signal {}, stopping", signal);
    }
    server.close();
    info!("server gracefully stopped");
}
