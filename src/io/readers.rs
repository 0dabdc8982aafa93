use crate::{io::is_gz, utils::whichever::define_whichever};
use flate2::bufread::MultiGzDecoder;
use std::{
    fs::File,
    io::{BufReader, Stdin, stdin},
};

define_whichever! {
    /// An enum for the acceptable alignment input sources.
    ///
    /// To construct this, use [`AlnInput::open`]. The [`Zipped`] variant is
    /// chosen if the file has extension `gz`; the argument `-` selects
    /// standard input.
    ///
    /// [`Zipped`]: AlnInput::Zipped
    pub(crate) enum AlnInput {
        /// A regular uncompressed file.
        File(BufReader<File>),
        /// A gzip compressed file, decoded lazily.
        Zipped(MultiGzDecoder<BufReader<File>>),
        /// The standard input stream.
        Stdin(Stdin),
    }

    impl Read for AlnInput {}
}

impl AlnInput {
    /// Opens an alignment input from a command-line file argument.
    ///
    /// `-` selects stdin; a name ending in `.gz` is decompressed
    /// transparently.
    ///
    /// ## Errors
    ///
    /// Any IO errors when opening the file are propagated.
    pub(crate) fn open(name: &str) -> std::io::Result<Self> {
        if name == "-" {
            return Ok(AlnInput::Stdin(stdin()));
        }

        let buf_reader = BufReader::new(File::open(name)?);

        if is_gz(name) {
            Ok(AlnInput::Zipped(MultiGzDecoder::new(buf_reader)))
        } else {
            Ok(AlnInput::File(buf_reader))
        }
    }
}
