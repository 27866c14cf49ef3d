//! Human-readable overview of a decoded event container

use std::fmt;

use hashbrown::{HashMap, HashSet};

use super::types::{Chunk, EventDocument};

/// One line of the chunk table
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRow {
    pub tag: String,
    pub structured: bool,
    pub event_hash: u32,
    pub start_time: f32,
    pub end_time: f32,
    pub element_id: u32,
    pub phases: Option<usize>,
    pub detail: String,
}

impl ChunkRow {
    fn new(chunk: &Chunk) -> Self {
        let (phases, detail) = match chunk {
            Chunk::Hit(hit) => {
                let points: usize = hit.phases.iter().map(|p| p.points.len()).sum();
                let detail = format!("{} point(s), {} ref(s)", points, hit.ref_hashes.len());
                (Some(hit.phases.len()), detail)
            }
            Chunk::Collision(collision) => {
                let detail = format!("{} segment(s)", collision.segment_count());
                (Some(collision.phases.len()), detail)
            }
            Chunk::Opaque(opaque) => {
                let detail = match opaque.script() {
                    Some(script) => format!("script {:?}", preview(&script, 40)),
                    None => format!("{} byte(s)", opaque.bytes().len()),
                };
                (None, detail)
            }
        };
        Self {
            tag: chunk.tag_name(),
            structured: chunk.is_structured(),
            event_hash: chunk.event_hash(),
            start_time: chunk.start_time(),
            end_time: chunk.end_time(),
            element_id: chunk.element_id(),
            phases,
            detail,
        }
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars()
        .take_while(|&c| c != '\0')
        .take(max_chars)
        .collect()
}

/// Counts and per-chunk rows for `view`
#[derive(Debug, Clone, PartialEq)]
pub struct EventSummary {
    pub version: u32,
    pub anim_hash: u32,
    pub declared_chunks: u32,
    pub tag_counts: HashMap<String, usize>,
    pub structured: usize,
    pub opaque: usize,
    /// Distinct event hashes across all chunks
    pub unique_events: usize,
    /// Distinct hit-phase point counts, ascending
    pub point_tags: Vec<usize>,
    pub collision_phases: usize,
    pub collision_segments: usize,
    /// Earliest start and latest end over every chunk
    pub time_range: Option<(f32, f32)>,
    pub tail_len: usize,
    pub chunks: Vec<ChunkRow>,
}

impl EventDocument {
    pub fn summary(&self) -> EventSummary {
        let chunks: Vec<ChunkRow> = self.chunks.iter().map(ChunkRow::new).collect();
        let mut tag_counts = HashMap::new();
        for row in &chunks {
            *tag_counts.entry(row.tag.clone()).or_insert(0) += 1;
        }
        let unique_events = chunks
            .iter()
            .map(|row| row.event_hash)
            .collect::<HashSet<_>>()
            .len();
        let structured = chunks.iter().filter(|row| row.structured).count();

        let mut point_tags: Vec<usize> = self
            .chunks
            .iter()
            .filter_map(|chunk| match chunk {
                Chunk::Hit(hit) => Some(hit.phases.iter().map(|p| p.points.len())),
                _ => None,
            })
            .flatten()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        point_tags.sort_unstable();

        let (mut collision_phases, mut collision_segments) = (0, 0);
        for chunk in &self.chunks {
            if let Chunk::Collision(collision) = chunk {
                collision_phases += collision.phases.len();
                collision_segments += collision.segment_count();
            }
        }

        let time_range = chunks.iter().fold(None, |range, row| {
            Some(match range {
                None => (row.start_time, row.end_time),
                Some((lo, hi)) => (f32::min(lo, row.start_time), f32::max(hi, row.end_time)),
            })
        });

        EventSummary {
            version: self.version,
            anim_hash: self.anim_hash,
            declared_chunks: self.chunk_count,
            tag_counts,
            structured,
            opaque: chunks.len() - structured,
            unique_events,
            point_tags,
            collision_phases,
            collision_segments,
            time_range,
            tail_len: self.tail.len(),
            chunks,
        }
    }

    /// Phase-by-phase listing for `view --detail`
    pub fn detail(&self) -> DetailView<'_> {
        DetailView(self)
    }
}

impl fmt::Display for EventSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Version:  {}  anim=0x{:08X}",
            self.version, self.anim_hash
        )?;
        let mut tags: Vec<_> = self.tag_counts.iter().collect();
        tags.sort();
        let tags: Vec<String> = tags.iter().map(|(tag, n)| format!("{tag}={n}")).collect();
        writeln!(
            f,
            "Chunks:   {} (declared {})  [{}]",
            self.chunks.len(),
            self.declared_chunks,
            tags.join(" ")
        )?;
        writeln!(
            f,
            "Decoded:  {} structured, {} opaque  Events: {} unique",
            self.structured, self.opaque, self.unique_events
        )?;
        if !self.point_tags.is_empty() {
            let tags: Vec<String> = self.point_tags.iter().map(usize::to_string).collect();
            writeln!(f, "Points:   {} per phase", tags.join("/"))?;
        }
        if self.collision_phases > 0 {
            writeln!(
                f,
                "Collide:  {} phase(s), {} segment(s)",
                self.collision_phases, self.collision_segments
            )?;
        }
        if let Some((start, end)) = self.time_range {
            writeln!(f, "Time:     {start:.3}..{end:.3}")?;
        }
        if self.tail_len > 0 {
            writeln!(f, "Trailing: {} byte(s)", self.tail_len)?;
        }
        for (i, row) in self.chunks.iter().enumerate() {
            write!(
                f,
                "  #{:<3} {} {} event=0x{:08X} t={:.3}..{:.3} elem={}",
                i + 1,
                row.tag,
                if row.structured { "*" } else { " " },
                row.event_hash,
                row.start_time,
                row.end_time,
                row.element_id
            )?;
            if let Some(phases) = row.phases {
                write!(f, " phases={phases}")?;
            }
            writeln!(f, "  {}", row.detail)?;
        }
        Ok(())
    }
}

/// Display wrapper listing every phase of every structured chunk
pub struct DetailView<'a>(&'a EventDocument);

impl fmt::Display for DetailView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chunk) in self.0.chunks.iter().enumerate() {
            writeln!(
                f,
                "#{} {} event=0x{:08X}",
                i + 1,
                chunk.tag_name(),
                chunk.event_hash()
            )?;
            match chunk {
                Chunk::Hit(hit) => {
                    for (p, phase) in hit.phases.iter().enumerate() {
                        write!(f, "  phase {} t={:.3}", p + 1, phase.time)?;
                        match phase.bounding_box() {
                            Some(b) => writeln!(
                                f,
                                " box=({:.1},{:.1})-({:.1},{:.1}) points={}",
                                b.min_x,
                                b.min_y,
                                b.max_x,
                                b.max_y,
                                phase.points.len()
                            )?,
                            None => writeln!(f, " no points")?,
                        }
                    }
                    for hash in &hit.ref_hashes {
                        writeln!(f, "  ref 0x{hash:08X}")?;
                    }
                }
                Chunk::Collision(collision) => {
                    for (p, phase) in collision.phases.iter().enumerate() {
                        writeln!(f, "  phase {} t={:.3}", p + 1, phase.time)?;
                        for s in &phase.segments {
                            writeln!(
                                f,
                                "    ({:.1},{:.1})-({:.1},{:.1}) len={:.1}",
                                s.x1,
                                s.y1,
                                s.x2,
                                s.y2,
                                s.length()
                            )?;
                        }
                    }
                }
                Chunk::Opaque(opaque) => match opaque.script() {
                    Some(script) => writeln!(f, "  script: {}", preview(&script, 200))?,
                    None => writeln!(f, "  {} opaque byte(s)", opaque.bytes().len())?,
                },
            }
        }
        Ok(())
    }
}
