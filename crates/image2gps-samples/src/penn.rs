//! Bundled Penn Engineering campus samples.
//!
//! Six photos taken around the engineering quad, each with the coordinates
//! the demo "predicts" and the narrative it streams back.

use image2gps_types::{Coordinates, Record, SampleId};

/// Build a [`Record`] whose image lives at `/images/{id}.jpg`.
#[allow(clippy::too_many_arguments)]
fn sample(
    id: &str,
    title: &str,
    coordinates: Coordinates,
    zoom: Option<u8>,
    summary: &str,
    narrative: &str,
    background: &str,
    tags: &[&str],
) -> Record {
    Record {
        id: SampleId::from(id),
        title: title.to_owned(),
        coordinates,
        zoom,
        image: format!("/images/{id}.jpg"),
        narrative: narrative.to_owned(),
        background: background.to_owned(),
        summary: summary.to_owned(),
        tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
    }
}

/// The default sample set shown in the gallery, in display order.
pub fn penn_engineering_samples() -> Vec<Record> {
    vec![
        sample(
            "penn-smith-walk",
            "Smith Walk, University of Pennsylvania",
            Coordinates::new(39.95149, -75.19106),
            Some(17),
            "Tree-lined pedestrian walkway with Penn Engineering banner suspended above; hexagonal pavers and campus benches along both sides.",
            "The model sees the distinct Penn Engineering banner, the hexagonal patterned pathway, and surrounding historic facades, identifying this as Smith Walk—an iconic pedestrian spine running through the engineering sector of campus.",
            "Smith Walk is a central landscaped pedestrian corridor between 33rd and 34th Streets. Named in honor of chemist Edgar Fahs Smith, it forms part of Penn's historic campus pathways and connects key engineering buildings including Towne, Hayden, and Levine Hall.",
            &["university", "campus walkway", "engineering"],
        ),
        sample(
            "penn-skirkanich-hall",
            "Skirkanich Hall, University of Pennsylvania",
            Coordinates::new(39.951_914, -75.190_755),
            Some(17),
            "Modern glass-and-stone facade with cantilevered entry canopy; located within Penn Engineering complex near 33rd and Walnut.",
            "The model identifies the engraved lettering 'SKIRKANICH HALL' and the distinct glass corner lobby. Combined with the coordinates, it recognizes this building as Skirkanich Hall, home to Penn Bioengineering. This entrance view aligns with its north-facing side along 33rd Street.",
            "Opened in 2006 and designed by renowned architects Tod Williams & Billie Tsien, Skirkanich Hall serves as the center for Bioengineering at the University of Pennsylvania. The building connects to Towne Building and Levine Hall, forming part of the Penn Engineering quad.",
            &["university", "engineering", "modern architecture"],
        ),
        sample(
            "penn-edgar-fahs-smith-statue",
            "Edgar Fahs Smith Statue, University of Pennsylvania",
            Coordinates::new(39.951_633, -75.192_261),
            Some(17),
            "Bronze seated statue of Edgar Fahs Smith on a stone pedestal, located at the intersection of Smith Walk and 34th Street within the Penn Engineering precinct.",
            "The model identifies the engraved pedestal reading 'EDGAR FAHS SMITH' and recognizes the iconic seated bronze sculpture situated at the east end of Smith Walk. The statue's placement between the Towne and Vagelos Laboratory buildings matches known campus layout and aligns with the provided GPS coordinates.",
            "Created by sculptor R. Tait McKenzie and installed in 1925, the Edgar Fahs Smith statue honors the distinguished chemist and 13th provost of the University of Pennsylvania. Smith was known for his contributions to electrochemistry and the history of chemistry. The statue is a well-known landmark marking the engineering entrance corridor.",
            &["university", "campus landmark", "statue"],
        ),
        sample(
            "penn-meyerson-hall",
            "Meyerson Hall, University of Pennsylvania",
            Coordinates::new(39.952_464, -75.192_069),
            Some(17),
            "Red-brick modernist academic building with exposed concrete structural frames, home to the Stuart Weitzman School of Design.",
            "The model recognizes the Stuart Weitzman School of Design signage on the facade and the distinctive red-brick and concrete architectural style. Combined with the GPS location on Walnut Street near 34th Street, it identifies the building as Meyerson Hall.",
            "Completed in 1967 and named after Martin Meyerson, former president of the University of Pennsylvania, Meyerson Hall houses the Weitzman School of Design. The building includes studios, classrooms, and design research facilities, serving as the center of Penn's architecture and landscape architecture programs.",
            &["university", "architecture", "design school"],
        ),
        sample(
            "penn-levine-hall-walnut-street",
            "Levine Hall, University of Pennsylvania",
            Coordinates::new(39.952_625, -75.191_208),
            Some(17),
            "Brick-and-glass academic building along Walnut Street, with a cantilevered glass corner and view facing east toward the Philadelphia skyline.",
            "The model identifies the distinctive glass corner façade and dark brick exterior consistent with Levine Hall, part of the Penn Engineering complex. The provided GPS position aligns precisely with Walnut Street just west of 33rd Street, matching the observed street orientation and skyline direction.",
            "Levine Hall, completed in 2003 and designed by architect KieranTimberlake, houses the Department of Computer and Information Science at the University of Pennsylvania. The building connects internally to Wu and Chen Hall and the historic Towne Building, forming part of the core engineering corridor on Walnut Street.",
            &["university", "engineering", "computer science", "modern architecture"],
        ),
        sample(
            "penn-lerner-center-chancellor-walk",
            "Lerner Center, University of Pennsylvania",
            Coordinates::new(39.952_322, -75.192_114),
            Some(17),
            "Historic red-brick Italianate building along Chancellor Walk, with tall multi-pane windows and a landscaped lawn at its south entrance.",
            "The model recognizes the characteristic Italianate brick façade and window detailing of the Lerner Center, home to Penn's Department of Music. The nearby wayfinding sign indicating Chancellor Walk matches the documented accessible entrance to the building from this pedestrian path, and the GPS coordinates align with 201 South 34th Street on the Penn campus.",
            "Originally constructed in the early 1890s as part of the Foulke & Long Institute for Orphan Girls, the building later became the university’s Music Building and was extensively renovated and expanded into the Lerner Center in the late 2000s. The restoration preserved the historic Cope & Stewardson exterior while adding a modern east addition with classrooms, practice rooms, and music technology facilities for the Department of Music.",
            &["university", "music", "historic building"],
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn skirkanich_coordinates_match_the_table() {
        let samples = penn_engineering_samples();
        let skirkanich = samples
            .iter()
            .find(|r| r.id.as_str() == "penn-skirkanich-hall")
            .unwrap();
        assert_eq!(skirkanich.coordinates.to_fixed(), "39.9519, -75.1908");
    }

    #[test]
    fn ships_six_samples() {
        assert_eq!(penn_engineering_samples().len(), 6);
    }

    #[test]
    fn ids_are_unique() {
        let samples = penn_engineering_samples();
        let ids: BTreeSet<_> = samples.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), samples.len());
    }

    #[test]
    fn image_paths_follow_id() {
        for record in penn_engineering_samples() {
            assert_eq!(record.image, format!("/images/{}.jpg", record.id));
        }
    }

    #[test]
    fn smith_walk_is_first() {
        let samples = penn_engineering_samples();
        let first = samples.first().map(|r| r.id.as_str().to_owned());
        assert_eq!(first.as_deref(), Some("penn-smith-walk"));
    }

    #[test]
    fn all_samples_sit_on_campus() {
        for record in penn_engineering_samples() {
            assert!((39.94..39.96).contains(&record.coordinates.lat), "{}", record.id);
            assert!((-75.20..-75.18).contains(&record.coordinates.lng), "{}", record.id);
            assert!(!record.narrative.is_empty());
            assert!(!record.background.is_empty());
        }
    }
}
