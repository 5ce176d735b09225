// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A small CLI demonstrating the parser: feeds a file through in fixed-size chunks and reports
//! the stream format and frame count.

use std::fs::File;
use std::io::Read;
use std::process;

use clap::Arg;
use log::{error, info};

use flac_frame_parser::Record;

const CHUNK_SIZE: usize = 4096;

fn main() {
    pretty_env_logger::init();

    let matches = clap::Command::new("flacinfo")
        .version("1.0")
        .author("Philip Deljanov <philip.deljanov@gmail.com>")
        .about("Report stream format and frame counts for a FLAC file")
        .arg(Arg::new("streaming").long("streaming").help("Accept input that lacks the stream marker and metadata blocks"))
        .arg(Arg::new("INPUT").help("The input file path").required(true).index(1))
        .get_matches();

    let path = matches.value_of("INPUT").unwrap();
    let streaming = matches.is_present("streaming");

    if let Err(err) = run(path, streaming) {
        error!("{err}");
        process::exit(1);
    }
}

fn run(path: &str, streaming: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::open(path)?;
    let mut state = flac_frame_parser::init(streaming);

    let mut buf = [0u8; CHUNK_SIZE];
    let mut frame_count: u64 = 0;
    let mut total_samples: u64 = 0;
    let mut trailing_bytes: u64 = 0;

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }

        let records = flac_frame_parser::parse(&buf[..n], &mut state)?;
        for record in records {
            report(&record, &mut frame_count, &mut total_samples);
        }
    }

    let last = flac_frame_parser::flush(&mut state);
    if let Record::FrameBuffer { ref data, .. } = last {
        trailing_bytes = data.len() as u64;
    }
    report(&last, &mut frame_count, &mut total_samples);

    info!("frames={frame_count} total_samples={total_samples} trailing_bytes={trailing_bytes}");
    println!("frames={frame_count} total_samples={total_samples} trailing_bytes={trailing_bytes}");

    Ok(())
}

fn report(record: &Record, frame_count: &mut u64, total_samples: &mut u64) {
    match record {
        Record::StreamFormat(format) => {
            info!("stream format: {format:?}");
        }
        Record::OpaqueBuffer(buf) => {
            info!("opaque block, {} bytes", buf.len());
        }
        Record::FrameBuffer { data, metadata } => {
            *frame_count += 1;
            *total_samples += u64::from(metadata.samples);
            info!("frame #{frame_count}: {} bytes, {metadata:?}", data.len());
        }
    }
}
