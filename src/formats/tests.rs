use super::*;

//-----------------------------------------------------------------------------

#[test]
fn chrom_sizes() {
    let input = "# name\tlength\n\
        chr1\t248956422\n\
        \n\
        chr2\t242193529\n\
        chr1_KI270762v1_alt\t354444\n";
    let mut reader = input.as_bytes();
    let result = read_chrom_sizes(&mut reader);
    assert!(result.is_ok(), "Failed to read chromosome sizes: {}", result.unwrap_err());
    let sizes = result.unwrap();
    assert_eq!(sizes.len(), 3, "Wrong number of rows");
    assert_eq!(sizes[0], ("chr1".to_string(), 248956422), "Wrong first row");
    assert_eq!(sizes[2].0, "chr1_KI270762v1_alt", "Wrong last row");
}

#[test]
fn chrom_sizes_errors() {
    let mut reader = "chr1\n".as_bytes();
    assert!(read_chrom_sizes(&mut reader).is_err(), "A row without a length should fail");
    let mut reader = "chr1\tlong\n".as_bytes();
    assert!(read_chrom_sizes(&mut reader).is_err(), "A non-numeric length should fail");
}

//-----------------------------------------------------------------------------

#[test]
fn alt_loci() {
    let input = "# name\thost\tchromStart\tchromEnd\tlength\n\
        chr1_KI270762v1_alt\tchr1\t2448811\t2791270\t354444\n\
        chr2_KI270774v1_alt\tchr2\t90402511\t91402511\t223625\n";
    let mut reader = input.as_bytes();
    let result = read_alt_loci(&mut reader);
    assert!(result.is_ok(), "Failed to read alt loci: {}", result.unwrap_err());
    let loci = result.unwrap();
    assert_eq!(loci.len(), 2, "Wrong number of rows");
    assert_eq!(loci[0], AltLocus {
        name: "chr1_KI270762v1_alt".to_string(),
        host: "chr1".to_string(),
        start: 2448811,
        end: 2791270,
        length: 354444,
    }, "Wrong first row");
}

#[test]
fn alt_loci_errors() {
    let mut reader = "chr1_KI270762v1_alt\tchr1\t2448811\t2791270\n".as_bytes();
    assert!(read_alt_loci(&mut reader).is_err(), "A row with 4 fields should fail");
}

//-----------------------------------------------------------------------------

#[test]
fn alignments() {
    // Tabular aligner output with 1-based inclusive coordinates, including a
    // row for another query and a reverse-strand row.
    let input = "altA\tregion\t99.0\t180\t11\t190\t11\t190\n\
        altB\tregion\t99.0\t150\t1\t150\t1\t150\n\
        altA\tregion\t97.5\t50\t1\t50\t200\t151\n";
    let mut reader = input.as_bytes();
    let result = read_alignments(&mut reader, "altA", 300);
    assert!(result.is_ok(), "Failed to read alignments: {}", result.unwrap_err());
    let records = result.unwrap();
    assert_eq!(records.len(), 1, "Wrong number of records");
    assert_eq!(
        records[0],
        AlignmentRecord::new(10..190, 310..490, 99.0, 180),
        "Wrong record after lifting by the placement offset"
    );
}

#[test]
fn alignment_errors() {
    let mut reader = "altA\tregion\t99.0\t180\t11\t190\t11\n".as_bytes();
    assert!(read_alignments(&mut reader, "altA", 0).is_err(), "A row with 7 fields should fail");
    let mut reader = "altA\tregion\t99.0\t180\t0\t190\t11\t190\n".as_bytes();
    assert!(
        read_alignments(&mut reader, "altA", 0).is_err(),
        "0-based coordinates should be detected"
    );
}

//-----------------------------------------------------------------------------

#[test]
fn genes() {
    let input = "# name\tchrom\tstrand\ttxStart\ttxEnd\texonStarts\texonEnds\tname2\n\
        NM_001005484\tchr1\t+\t65418\t71585\t65418,69036,\t65433,71585,\tOR4F5\n\
        NM_152486\tchr1\t-\t925730\t944581\n";
    let mut reader = input.as_bytes();
    let result = read_genes(&mut reader);
    assert!(result.is_ok(), "Failed to read genes: {}", result.unwrap_err());
    let genes = result.unwrap();
    assert_eq!(genes.len(), 2, "Wrong number of rows");
    assert_eq!(genes[0], GeneRecord {
        name: "NM_001005484".to_string(),
        display_name: Some("OR4F5".to_string()),
        chrom: "chr1".to_string(),
        strand: Strand::Forward,
        tx_start: 65418,
        tx_end: 71585,
        exons: vec![(65418, 65433), (69036, 71585)],
    }, "Wrong first row");
    assert_eq!(genes[1].strand, Strand::Reverse, "Wrong strand for the second row");
    assert!(genes[1].exons.is_empty(), "The second row should not have exons");
    assert_eq!(genes[1].display_name, None, "The second row should not have a display name");
}

#[test]
fn gene_errors() {
    let mut reader = "NM_152486\tchr1\t-\t944581\t925730\n".as_bytes();
    assert!(read_genes(&mut reader).is_err(), "A reversed transcript interval should fail");
    let mut reader = "NM_152486\tchr1\t.\t925730\t944581\n".as_bytes();
    assert!(read_genes(&mut reader).is_err(), "An invalid strand should fail");
    let mut reader = "NM_152486\tchr1\t-\t925730\t944581\t925730,\t944581,926000,\n".as_bytes();
    assert!(read_genes(&mut reader).is_err(), "Mismatched exon lists should fail");
}

//-----------------------------------------------------------------------------
