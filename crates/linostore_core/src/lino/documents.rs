//! Named documents on a shared substrate.
//!
//! # Responsibility
//! - Associate a document name with the packed top-level sequence of its nodes.
//! - Provide the storage facade used by import and export services.
//!
//! # Invariants
//! - Document: `(DocumentMarker, text(name))`; content: `(document, top sequence)`.
//! - One name, one document; documents are immutable once created.
//! - A failed create leaves no trace in the substrate or in codec caches.

use super::{
    LinkDecoder, LinkEncoder, LinoError, LinoResult, Markers, ReferenceInterner, TextCodec,
};
use crate::links::{Flow, LinkId, Links, ANY};
use crate::model::node::Node;
use log::{debug, warn};

/// Name -> top-level sequence index.
pub struct DocumentIndex<'s, 'a, L: ?Sized> {
    links: &'a L,
    marker: LinkId,
    text: &'s TextCodec<'a, L>,
}

impl<'s, 'a, L: Links + ?Sized> DocumentIndex<'s, 'a, L> {
    pub fn new(links: &'a L, markers: &Markers, text: &'s TextCodec<'a, L>) -> Self {
        Self {
            links,
            marker: markers.document,
            text,
        }
    }

    /// Registers `name` with its top-level sequence.
    ///
    /// # Errors
    /// - `InvalidDocumentName` for an empty name.
    /// - `DuplicateDocument` when `name` is already registered.
    pub fn register(&self, name: &str, top_sequence: LinkId) -> LinoResult<LinkId> {
        ensure_document_name(name)?;
        if self.find_document(name)?.is_some() {
            return Err(LinoError::DuplicateDocument(name.to_string()));
        }
        let name_sequence = self.text.encode(name)?;
        let document = self.links.get_or_create(self.marker, name_sequence)?;
        self.links.get_or_create(document, top_sequence)?;
        Ok(document)
    }

    /// Finds the document relation for `name` without creating anything.
    pub fn find_document(&self, name: &str) -> LinoResult<Option<LinkId>> {
        match self.text.find(name)? {
            Some(name_sequence) => Ok(self.links.find(self.marker, name_sequence)?),
            None => Ok(None),
        }
    }

    /// Returns the top-level sequence stored for `document`.
    ///
    /// # Errors
    /// - `NoDocumentContent` when no `(document, _)` relation exists.
    pub fn find_top_sequence(&self, document: LinkId) -> LinoResult<LinkId> {
        let mut found = None;
        self.links.each(document, ANY, &mut |link| {
            found = Some(link.target);
            Flow::Break
        })?;
        found.ok_or(LinoError::NoDocumentContent(document))
    }

    /// Every registered document name, sorted.
    pub fn list_documents(&self) -> LinoResult<Vec<String>> {
        let mut names = self
            .links
            .all(self.marker, ANY)?
            .into_iter()
            .map(|document| self.text.decode(document.target))
            .collect::<LinoResult<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }
}

/// Document storage over one substrate.
///
/// Owns the markers and the reference interner, and hands out short-lived
/// encoder, decoder and index views borrowing them.
pub struct LinoDocuments<'a, L: ?Sized> {
    links: &'a L,
    markers: Markers,
    references: ReferenceInterner<'a, L>,
}

impl<'a, L: Links + ?Sized> LinoDocuments<'a, L> {
    /// Bootstraps markers and opens document storage.
    ///
    /// # Errors
    /// - `IncompatibleFormat` when the substrate holds another format.
    pub fn open(links: &'a L) -> LinoResult<Self> {
        Ok(Self::with_markers(links, Markers::initialize(links)?))
    }

    /// Opens document storage for reading only.
    ///
    /// Returns `None` on a substrate that was never stamped; nothing is
    /// written either way.
    ///
    /// # Errors
    /// - `IncompatibleFormat` when the substrate holds another format.
    pub fn open_existing(links: &'a L) -> LinoResult<Option<Self>> {
        Ok(Markers::resolve(links)?.map(|markers| Self::with_markers(links, markers)))
    }

    fn with_markers(links: &'a L, markers: Markers) -> Self {
        let references = ReferenceInterner::new(links, &markers);
        Self {
            links,
            markers,
            references,
        }
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn references(&self) -> &ReferenceInterner<'a, L> {
        &self.references
    }

    pub fn encoder(&self) -> LinkEncoder<'_, 'a, L> {
        LinkEncoder::new(self.links, &self.markers, &self.references)
    }

    pub fn decoder(&self) -> LinkDecoder<'_, 'a, L> {
        LinkDecoder::new(self.links, &self.markers, &self.references)
    }

    pub fn index(&self) -> DocumentIndex<'_, 'a, L> {
        DocumentIndex::new(self.links, &self.markers, self.references.text())
    }

    /// Encodes `nodes` and registers them under `name` as one atomic unit.
    ///
    /// # Errors
    /// - `InvalidDocumentName`, `DuplicateDocument` or `EmptyNode`; the
    ///   substrate is unchanged in every error case.
    pub fn create_document(&self, name: &str, nodes: &[Node]) -> LinoResult<LinkId> {
        ensure_document_name(name)?;
        let result = self.links.exclusive(|| {
            let index = self.index();
            if index.find_document(name)?.is_some() {
                return Err(LinoError::DuplicateDocument(name.to_string()));
            }
            let top_sequence = self.encoder().encode_nodes(nodes)?;
            let document = index.register(name, top_sequence)?;
            debug!(
                "event=document_register module=lino status=ok document={} top_sequence={} nodes={}",
                document,
                top_sequence,
                nodes.len()
            );
            Ok(document)
        });
        if let Err(err) = &result {
            // Identifiers created inside the rolled-back unit are gone.
            self.references.clear_cache();
            warn!("event=document_register module=lino status=error error={err}");
        }
        result
    }

    /// Decodes the nodes stored under `name`.
    ///
    /// # Errors
    /// - `NoSuchDocument` when `name` is not registered.
    pub fn read_document(&self, name: &str) -> LinoResult<Vec<Node>> {
        let index = self.index();
        let document = index
            .find_document(name)?
            .ok_or_else(|| LinoError::NoSuchDocument(name.to_string()))?;
        let top_sequence = index.find_top_sequence(document)?;
        self.decoder().decode_sequence(top_sequence)
    }

    pub fn contains_document(&self, name: &str) -> LinoResult<bool> {
        Ok(self.index().find_document(name)?.is_some())
    }

    pub fn list_documents(&self) -> LinoResult<Vec<String>> {
        self.index().list_documents()
    }
}

fn ensure_document_name(name: &str) -> LinoResult<()> {
    if name.is_empty() {
        return Err(LinoError::InvalidDocumentName);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::LinoDocuments;
    use crate::db::open_db_in_memory;
    use crate::links::{Links, SqliteLinks};
    use crate::lino::LinoError;
    use crate::model::node::Node;

    fn one_one() -> Vec<Node> {
        vec![Node::composite(
            "1",
            vec![Node::reference("1"), Node::reference("1")],
        )]
    }

    #[test]
    fn documents_are_isolated_and_listed() {
        let conn = open_db_in_memory().unwrap();
        let links = SqliteLinks::try_new(&conn).unwrap();
        let storage = LinoDocuments::open(&links).unwrap();

        let second = vec![Node::reference("x")];
        storage.create_document("d2", &second).unwrap();
        storage.create_document("d1", &one_one()).unwrap();

        assert_eq!(storage.read_document("d1").unwrap(), one_one());
        assert_eq!(storage.read_document("d2").unwrap(), second);
        assert_eq!(storage.list_documents().unwrap(), vec!["d1", "d2"]);
    }

    #[test]
    fn duplicate_create_changes_nothing() {
        let conn = open_db_in_memory().unwrap();
        let links = SqliteLinks::try_new(&conn).unwrap();
        let storage = LinoDocuments::open(&links).unwrap();

        storage.create_document("d1", &one_one()).unwrap();
        let count = links.count().unwrap();

        let err = storage
            .create_document("d1", &[Node::reference("fresh")])
            .unwrap_err();
        assert!(matches!(err, LinoError::DuplicateDocument(name) if name == "d1"));
        assert_eq!(links.count().unwrap(), count);
        assert_eq!(storage.references().find("fresh").unwrap(), None);
        assert_eq!(storage.read_document("d1").unwrap(), one_one());
    }

    #[test]
    fn failed_encode_rolls_back_and_clears_caches() {
        let conn = open_db_in_memory().unwrap();
        let links = SqliteLinks::try_new(&conn).unwrap();
        let storage = LinoDocuments::open(&links).unwrap();
        let count = links.count().unwrap();

        let broken = vec![
            Node::reference("kept-out"),
            Node {
                id: None,
                children: None,
            },
        ];
        assert!(matches!(
            storage.create_document("d1", &broken),
            Err(LinoError::EmptyNode)
        ));
        assert_eq!(links.count().unwrap(), count);
        assert!(!storage.contains_document("d1").unwrap());

        storage
            .create_document("d1", &[Node::reference("kept-out")])
            .unwrap();
        assert_eq!(
            storage.read_document("d1").unwrap(),
            vec![Node::reference("kept-out")]
        );
    }

    #[test]
    fn missing_and_invalid_names() {
        let conn = open_db_in_memory().unwrap();
        let links = SqliteLinks::try_new(&conn).unwrap();
        let storage = LinoDocuments::open(&links).unwrap();

        assert!(matches!(
            storage.read_document("nope"),
            Err(LinoError::NoSuchDocument(name)) if name == "nope"
        ));
        assert!(matches!(
            storage.create_document("", &one_one()),
            Err(LinoError::InvalidDocumentName)
        ));
    }

    #[test]
    fn document_without_content_is_reported() {
        let conn = open_db_in_memory().unwrap();
        let links = SqliteLinks::try_new(&conn).unwrap();
        let storage = LinoDocuments::open(&links).unwrap();

        let name = storage.references().text().encode("orphan").unwrap();
        let document = links
            .get_or_create(storage.markers().document, name)
            .unwrap();

        assert!(storage.contains_document("orphan").unwrap());
        assert!(matches!(
            storage.read_document("orphan"),
            Err(LinoError::NoDocumentContent(id)) if id == document
        ));
    }

    #[test]
    fn empty_document_round_trips() {
        let conn = open_db_in_memory().unwrap();
        let links = SqliteLinks::try_new(&conn).unwrap();
        let storage = LinoDocuments::open(&links).unwrap();

        storage.create_document("blank", &[]).unwrap();
        assert!(storage.read_document("blank").unwrap().is_empty());
    }
}
