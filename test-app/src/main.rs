// gsmlink test application -- CLI tool for exercising the modem driver
// against real hardware or a mock transport.
//
// Usage:
//   gsmlink-test-app --device /dev/ttyUSB0 check
//   gsmlink-test-app --device /dev/ttyUSB0 --baud 115200 signal
//   gsmlink-test-app --device COM3 sim
//   gsmlink-test-app --device /dev/ttyUSB0 --country-code 33 \
//       send --to 0612345678 --message "hello from gsmlink"
//   gsmlink-test-app --device /dev/ttyUSB0 receive
//   gsmlink-test-app --mock check
//
// Logging is controlled through RUST_LOG (e.g. RUST_LOG=gsmlink=trace).

use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use gsmlink::{LineConfig, Modem, ModemBuilder, SerialLine, Sms, SttyTranslator};
use gsmlink_test_harness::MockTransport;

/// gsmlink test application -- exercises the modem driver from the
/// command line.
#[derive(Parser)]
#[command(name = "gsmlink-test-app", version)]
struct Cli {
    /// Serial device path or COM<N> alias.
    #[arg(long, global = true)]
    device: Option<String>,

    /// Baud rate applied before opening the line.
    #[arg(long, global = true, default_value_t = 9600)]
    baud: u32,

    /// Country code used for SMS number formatting.
    #[arg(long, global = true)]
    country_code: Option<u16>,

    /// Use a mock transport with canned replies instead of hardware.
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send `AT` and report whether the modem answers OK.
    Check,
    /// Query and decode the signal quality.
    Signal,
    /// Query the SIM state (ready / PIN required).
    Sim,
    /// Send a text-mode SMS.
    Send {
        /// Destination number in local form.
        #[arg(long)]
        to: String,
        /// Message body.
        #[arg(long)]
        message: String,
    },
    /// Poll once for an inbound SMS notification.
    Receive,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut modem = build_modem(&cli).await?;
    modem.open_default().await?;

    match &cli.command {
        Command::Check => {
            let reply = modem.check().await?;
            println!("reply: {reply}");
            println!("ok: {}", reply.is_ok());
        }
        Command::Signal => {
            let quality = modem.signal_quality().await?;
            println!(
                "index {} -> {} ({:.1}%, {} dBm)",
                quality.value(),
                quality.level(),
                quality.percent(),
                quality.rssi_dbm()
            );
        }
        Command::Sim => {
            if modem.is_ready().await? {
                println!("SIM ready");
            } else if modem.require_pin().await? {
                println!("SIM PIN required");
            } else {
                println!("SIM state unknown");
            }
        }
        Command::Send { to, message } => {
            let mut sms = Sms::new(to.clone(), message.clone());
            if let Some(cc) = cli.country_code {
                sms = sms.with_country_code(cc);
            }
            let reply = modem.send_sms(&sms).await?;
            println!("reply: {reply}");
            println!("sent: {}", reply.is_ok());
        }
        Command::Receive => match modem.receive_sms().await? {
            Some(sms) => println!("{sms}"),
            None => println!("no message"),
        },
    }

    modem.close().await?;
    Ok(())
}

async fn build_modem(cli: &Cli) -> Result<Modem> {
    if cli.mock {
        return Ok(mock_modem(cli).await?);
    }

    let Some(device) = &cli.device else {
        bail!("--device is required unless --mock is set");
    };

    let modem = ModemBuilder::new()
        .device(device)
        .line_config(LineConfig::new(cli.baud)?)
        .build()
        .await?;
    Ok(modem)
}

/// Build a modem over a mock transport pre-loaded with the replies the
/// selected subcommand expects.
async fn mock_modem(cli: &Cli) -> Result<Modem> {
    let mock = MockTransport::new();

    match &cli.command {
        Command::Check => {
            mock.expect(b"AT\r\n", b"AT\r\n\r\nOK\r\n");
        }
        Command::Signal => {
            mock.expect(b"AT+CSQ\r\n", b"+CSQ: 21,99\r\n\r\nOK\r\n");
        }
        Command::Sim => {
            // Both is_ready() and require_pin() issue the state query.
            for _ in 0..2 {
                mock.expect(b"AT+CMEE=2\r\n", b"OK\r\n");
                mock.expect(b"AT+CPIN?\r\n", b"+CPIN: READY\r\n\r\nOK\r\n");
            }
        }
        Command::Send { to, message } => {
            let mut sms = Sms::new(to.clone(), message.clone());
            if let Some(cc) = cli.country_code {
                sms = sms.with_country_code(cc);
            }
            let address = format!("AT+CMGS=\"{}\"\r\n", sms.international_number());
            mock.expect(address.as_bytes(), b"> ");
            mock.expect(message.as_bytes(), b"");
            mock.expect(&[0x1A], b"+CMGS: 1\r\n\r\nOK\r\n");
        }
        Command::Receive => {
            mock.push_incoming(
                b"+CMT: \"+3312345678\",\"\",\"23/01/01,12:00:00+01\"\r\nhello from the mock\r\n",
            );
        }
    }

    let mut line = SerialLine::new(Box::new(mock), Box::new(SttyTranslator));
    line.bind_device(cli.device.as_deref().unwrap_or("/dev/ttyUSB0"))
        .await?;

    let modem = ModemBuilder::new()
        .write_settle(Duration::from_millis(1))
        .command_settle(Duration::from_millis(1))
        .sms_settle(Duration::from_millis(1))
        .build_with_line(line)
        .await?;
    Ok(modem)
}
