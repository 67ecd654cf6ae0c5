//! Query syntax and search options through the public facade.

use std::collections::HashSet;
use std::time::Duration;

use lectern::prelude::*;
use lectern::search::NEUTRAL_SCORE;

const TIME: Duration = Duration::from_secs(30);

fn fruit_index() -> Result<SearchIndex> {
    let index = SearchIndex::new(IndexConfig::default())?;
    index
        .on_index_lane(|indexer| {
            indexer.add_text("mem://apple", "apple apple orchard")?;
            indexer.add_text("mem://banana", "banana plantation")?;
            indexer.add_text("mem://both", "apple banana smoothie")?;
            indexer.add_text("mem://neither", "carrot soup")?;
            Ok::<_, LecternError>(())
        })?
        .wait()??;
    Ok(index)
}

fn search(index: &SearchIndex, query: &str, options: SearchOptions) -> Result<SearchOutcome> {
    index.search(query, options, 50, TIME)?.collect_outcome()
}

fn identifiers(outcome: &SearchOutcome) -> HashSet<&str> {
    outcome.matches.iter().map(|m| m.identifier.as_str()).collect()
}

fn syntax_position(index: &SearchIndex, query: &str) -> Option<usize> {
    match index.search(query, SearchOptions::DEFAULT, 10, TIME) {
        Err(e) => e.syntax_position(),
        Ok(_) => None,
    }
}

#[test]
fn test_malformed_queries_report_position() -> Result<()> {
    let index = fruit_index()?;

    assert_eq!(syntax_position(&index, ""), Some(0));
    assert_eq!(syntax_position(&index, "apple)"), Some(5));
    assert_eq!(syntax_position(&index, "(apple OR banana"), Some(0));
    assert_eq!(syntax_position(&index, "apple AND"), Some(6));
    assert_eq!(syntax_position(&index, "apple OR OR banana"), Some(6));
    assert_eq!(syntax_position(&index, "ap*ple"), Some(2));
    assert_eq!(syntax_position(&index, "\"apple banana"), Some(0));
    Ok(())
}

#[test]
fn test_deeply_nested_queries_are_rejected() -> Result<()> {
    let index = fruit_index()?;

    let nested = format!("{}apple{}", "(".repeat(1000), ")".repeat(1000));
    let err = index
        .search(&nested, SearchOptions::DEFAULT, 10, TIME)
        .unwrap_err();
    assert!(matches!(err, LecternError::QuerySyntax { .. }));
    assert_eq!(err.syntax_position(), Some(128));

    // Long NOT runs are not nesting.
    let negated = format!("{}apple", "!".repeat(200_000));
    let outcome = search(&index, &negated, SearchOptions::DEFAULT)?;
    assert_eq!(
        identifiers(&outcome),
        HashSet::from(["mem://apple", "mem://both"])
    );
    let outcome = search(&index, &format!("!{negated}"), SearchOptions::DEFAULT)?;
    assert_eq!(
        identifiers(&outcome),
        HashSet::from(["mem://banana", "mem://neither"])
    );

    let shallow = SearchIndex::new(IndexConfig::builder().max_query_depth(1).build()?)?;
    assert!(shallow.search("(apple)", SearchOptions::DEFAULT, 10, TIME).is_ok());
    assert_eq!(syntax_position(&shallow, "((apple))"), Some(1));
    Ok(())
}

#[test]
fn test_syntax_error_is_reported_before_evaluation() -> Result<()> {
    let index = fruit_index()?;
    let err = index
        .search("apple AND (", SearchOptions::DEFAULT, 10, TIME)
        .unwrap_err();
    assert!(matches!(err, LecternError::QuerySyntax { .. }));
    assert!(err.to_string().contains("position"));
    Ok(())
}

#[test]
fn test_space_means_or() -> Result<()> {
    let index = fruit_index()?;

    let and = search(&index, "apple banana", SearchOptions::DEFAULT)?;
    assert_eq!(identifiers(&and), HashSet::from(["mem://both"]));

    let or = search(
        &index,
        "apple banana",
        SearchOptions::DEFAULT.with_space_means_or(true),
    )?;
    assert_eq!(
        identifiers(&or),
        HashSet::from(["mem://apple", "mem://banana", "mem://both"])
    );

    // Explicit operators are unaffected.
    let explicit = search(
        &index,
        "apple AND banana",
        SearchOptions::DEFAULT.with_space_means_or(true),
    )?;
    assert_eq!(identifiers(&explicit), HashSet::from(["mem://both"]));
    Ok(())
}

#[test]
fn test_option_bits() {
    let options = SearchOptions::from_bits(
        SearchOptions::NO_RELEVANCE_SCORES | SearchOptions::FIND_SIMILAR,
    );
    assert!(options.no_relevance_scores);
    assert!(options.find_similar);
    assert!(!options.space_means_or);
    assert_eq!(SearchOptions::from_bits(options.bits()), options);
}

#[test]
fn test_no_relevance_scores_are_neutral() -> Result<()> {
    let index = fruit_index()?;
    let outcome = search(
        &index,
        "apple OR banana",
        SearchOptions::DEFAULT.with_no_relevance_scores(true),
    )?;

    assert_eq!(outcome.matches.len(), 3);
    assert!(outcome.matches.iter().all(|m| m.score == NEUTRAL_SCORE));
    Ok(())
}

#[test]
fn test_find_similar_treats_operators_as_text() -> Result<()> {
    let index = fruit_index()?;
    let similar = SearchOptions::DEFAULT.with_find_similar(true);

    // Unbalanced syntax is fine: the text is only analyzed.
    let outcome = search(&index, "NOT apple (", similar)?;
    assert_eq!(
        identifiers(&outcome),
        HashSet::from(["mem://apple", "mem://both"])
    );

    let outcome = search(&index, "apple smoothie", similar)?;
    assert_eq!(outcome.matches[0].identifier, "mem://both");
    assert!(outcome.matches.iter().all(|m| m.score > 0.0 && m.score <= 1.0 + f32::EPSILON));
    Ok(())
}

#[test]
fn test_lowercase_keywords_are_plain_words() -> Result<()> {
    let index = fruit_index()?;
    // `or` is a stop word, so the query reduces to `apple AND banana`.
    let outcome = search(&index, "apple or banana", SearchOptions::DEFAULT)?;
    assert_eq!(identifiers(&outcome), HashSet::from(["mem://both"]));
    Ok(())
}

#[test]
fn test_stop_words_do_not_empty_a_query() -> Result<()> {
    let index = SearchIndex::new(IndexConfig::default())?;
    index
        .on_index_lane(|indexer| {
            indexer.add_text("mem://history", "A history of Rome")?;
            indexer.add_text("mem://rome", "Rome in spring")?;
            indexer.add_text("mem://paris", "Paris in spring")?;
            Ok::<_, LecternError>(())
        })?
        .wait()??;

    let outcome = search(&index, "history of rome", SearchOptions::DEFAULT)?;
    assert_eq!(identifiers(&outcome), HashSet::from(["mem://history"]));

    let outcome = search(&index, "rome AND it", SearchOptions::DEFAULT)?;
    assert_eq!(
        identifiers(&outcome),
        HashSet::from(["mem://history", "mem://rome"])
    );

    let outcome = search(&index, "spring AND NOT the", SearchOptions::DEFAULT)?;
    assert_eq!(
        identifiers(&outcome),
        HashSet::from(["mem://rome", "mem://paris"])
    );

    // Nothing indexable is left at all.
    let outcome = search(&index, "NOT the", SearchOptions::DEFAULT)?;
    assert!(outcome.matches.is_empty());
    assert_eq!(outcome.state, SessionState::Completed);
    Ok(())
}

#[test]
fn test_unknown_terms_match_nothing() -> Result<()> {
    let index = fruit_index()?;
    let outcome = search(&index, "durian", SearchOptions::DEFAULT)?;
    assert!(outcome.matches.is_empty());
    assert_eq!(outcome.state, SessionState::Completed);

    let outcome = search(&index, "NOT durian", SearchOptions::DEFAULT)?;
    assert_eq!(outcome.matches.len(), 4);
    Ok(())
}
