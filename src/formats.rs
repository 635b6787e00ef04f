//! Readers for the text tables consumed by the graph tools.
//!
//! All readers accept the output of [`crate::utils::open_file`], so the input
//! files may be gzip-compressed.
//! Lines that are empty or start with `#` are skipped.
//!
//! ### Chromosome sizes
//!
//! Two whitespace-separated columns: sequence name and length
//! (the UCSC `chrom.sizes` format).
//!
//! ### Alt locus placements
//!
//! Five columns: locus name, host chromosome, placement start, placement end,
//! locus length. Coordinates are 0-based and half-open.
//!
//! ### Alignment records
//!
//! Eight columns in the style of tabular BLAST output
//! (`qseqid sseqid pident length qstart qend sstart send`):
//! locus name, target name, identity percentage, alignment length, and the
//! aligned intervals on the locus and the target, 1-based and inclusive.
//! The target is typically an extract of the placement region, so the reader
//! lifts target coordinates by a caller-supplied offset.
//! Rows for other query sequences and rows with reversed intervals are
//! skipped: the merger only consumes forward-strand evidence.
//!
//! ### Genes
//!
//! Five to eight columns: gene identifier, source sequence, strand,
//! transcript start, transcript end, and optionally comma-separated exon
//! start and end lists plus a display name.
//! Coordinates are 0-based and half-open, as in the UCSC genePred format.

use crate::graph::AltLocus;
use crate::merge::AlignmentRecord;
use crate::multipath::GeneRecord;
use crate::translate::Strand;

use std::io::BufRead;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

// Splits the input into relevant lines with line numbers for error messages.
fn data_lines<R: BufRead>(reader: &mut R) -> Result<Vec<(usize, String)>, String> {
    let mut result: Vec<(usize, String)> = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(|x| x.to_string())?;
        let trimmed = line.trim_end();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        result.push((number + 1, trimmed.to_string()));
    }
    Ok(result)
}

fn parse_usize(field: &str, line: usize, what: &str) -> Result<usize, String> {
    field.parse().map_err(|_| {
        format!("Line {}: invalid {}: {}", line, what, field)
    })
}

fn parse_f64(field: &str, line: usize, what: &str) -> Result<f64, String> {
    field.parse().map_err(|_| {
        format!("Line {}: invalid {}: {}", line, what, field)
    })
}

fn parse_strand(field: &str, line: usize) -> Result<Strand, String> {
    if field.len() == 1 {
        if let Some(strand) = Strand::from_symbol(field.as_bytes()[0]) {
            return Ok(strand);
        }
    }
    Err(format!("Line {}: invalid strand: {}", line, field))
}

// Parses a comma-separated offset list, tolerating a trailing comma.
fn parse_offset_list(field: &str, line: usize, what: &str) -> Result<Vec<usize>, String> {
    let mut result: Vec<usize> = Vec::new();
    for part in field.split(',') {
        if part.is_empty() {
            continue;
        }
        result.push(parse_usize(part, line, what)?);
    }
    Ok(result)
}

//-----------------------------------------------------------------------------

/// Reads a chromosome size table: rows of (name, length).
pub fn read_chrom_sizes<R: BufRead>(reader: &mut R) -> Result<Vec<(String, usize)>, String> {
    let mut result: Vec<(String, usize)> = Vec::new();
    for (number, line) in data_lines(reader)? {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(format!("Line {}: expected a name and a length", number));
        }
        let len = parse_usize(fields[1], number, "sequence length")?;
        result.push((fields[0].to_string(), len));
    }
    Ok(result)
}

/// Reads an alt locus placement table: rows of
/// (name, host, placement start, placement end, locus length).
pub fn read_alt_loci<R: BufRead>(reader: &mut R) -> Result<Vec<AltLocus>, String> {
    let mut result: Vec<AltLocus> = Vec::new();
    for (number, line) in data_lines(reader)? {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 {
            return Err(format!("Line {}: expected 5 fields, got {}", number, fields.len()));
        }
        result.push(AltLocus {
            name: fields[0].to_string(),
            host: fields[1].to_string(),
            start: parse_usize(fields[2], number, "placement start")?,
            end: parse_usize(fields[3], number, "placement end")?,
            length: parse_usize(fields[4], number, "locus length")?,
        });
    }
    Ok(result)
}

/// Reads alignment records for one locus from tabular aligner output.
///
/// Rows for other query sequences and rows with reversed intervals are
/// skipped.
/// Target coordinates are lifted by `offset`, the chromosome position of the
/// aligned target extract.
pub fn read_alignments<R: BufRead>(
    reader: &mut R,
    locus: &str,
    offset: usize
) -> Result<Vec<AlignmentRecord>, String> {
    let mut result: Vec<AlignmentRecord> = Vec::new();
    for (number, line) in data_lines(reader)? {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 8 {
            return Err(format!("Line {}: expected 8 fields, got {}", number, fields.len()));
        }
        if fields[0] != locus {
            continue;
        }
        let identity = parse_f64(fields[2], number, "identity")?;
        let length = parse_usize(fields[3], number, "alignment length")?;
        let locus_start = parse_usize(fields[4], number, "query start")?;
        let locus_end = parse_usize(fields[5], number, "query end")?;
        let target_start = parse_usize(fields[6], number, "target start")?;
        let target_end = parse_usize(fields[7], number, "target end")?;
        if locus_start == 0 || target_start == 0 {
            return Err(format!("Line {}: alignment coordinates are 1-based", number));
        }
        if locus_start > locus_end || target_start > target_end {
            continue;
        }
        result.push(AlignmentRecord::new(
            (locus_start - 1)..locus_end,
            (offset + target_start - 1)..(offset + target_end),
            identity,
            length,
        ));
    }
    Ok(result)
}

/// Reads a gene annotation table.
///
/// Each row has a gene identifier, a source sequence, a strand, and the
/// transcript interval, optionally followed by exon start and end lists and
/// a display name.
pub fn read_genes<R: BufRead>(reader: &mut R) -> Result<Vec<GeneRecord>, String> {
    let mut result: Vec<GeneRecord> = Vec::new();
    for (number, line) in data_lines(reader)? {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 {
            return Err(format!("Line {}: expected at least 5 fields, got {}", number, fields.len()));
        }
        let tx_start = parse_usize(fields[3], number, "transcript start")?;
        let tx_end = parse_usize(fields[4], number, "transcript end")?;
        if tx_start >= tx_end {
            return Err(format!("Line {}: empty transcript interval", number));
        }

        let mut exons: Vec<(usize, usize)> = Vec::new();
        if fields.len() >= 7 {
            let starts = parse_offset_list(fields[5], number, "exon start")?;
            let ends = parse_offset_list(fields[6], number, "exon end")?;
            if starts.len() != ends.len() {
                return Err(format!("Line {}: {} exon starts but {} exon ends", number, starts.len(), ends.len()));
            }
            for (start, end) in starts.into_iter().zip(ends) {
                if start >= end {
                    return Err(format!("Line {}: empty exon at offset {}", number, start));
                }
                exons.push((start, end));
            }
        }

        let display_name = if fields.len() >= 8 && fields[7] != fields[0] {
            Some(fields[7].to_string())
        } else {
            None
        };
        result.push(GeneRecord {
            name: fields[0].to_string(),
            display_name,
            chrom: fields[1].to_string(),
            strand: parse_strand(fields[2], number)?,
            tx_start,
            tx_end,
            exons,
        });
    }
    Ok(result)
}

//-----------------------------------------------------------------------------
